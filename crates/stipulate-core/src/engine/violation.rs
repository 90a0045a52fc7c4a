//! Constraint violations returned by validation calls
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::group::GroupId;
use crate::metadata::ConstraintDescriptor;
use crate::path::PropertyPath;
use crate::value::{Bean, Value};
use std::fmt;
use std::sync::Arc;

/// One failed constraint
#[derive(Clone)]
pub struct ConstraintViolation {
    pub(crate) message: String,
    pub(crate) message_template: String,
    pub(crate) property_path: PropertyPath,
    pub(crate) root_bean_type: String,
    pub(crate) root_bean: Option<Arc<dyn Bean>>,
    pub(crate) leaf_bean: Option<Arc<dyn Bean>>,
    pub(crate) invalid_value: Value,
    pub(crate) descriptor: Arc<ConstraintDescriptor>,
    pub(crate) group: GroupId,
    pub(crate) executable_parameters: Option<Vec<Value>>,
    pub(crate) executable_return_value: Option<Value>,
}

impl ConstraintViolation {
    /// Interpolated message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    pub fn property_path(&self) -> &PropertyPath {
        &self.property_path
    }

    pub fn root_bean_type(&self) -> &str {
        &self.root_bean_type
    }

    /// The validated root, absent for value and constructor parameter validation
    pub fn root_bean(&self) -> Option<&Arc<dyn Bean>> {
        self.root_bean.as_ref()
    }

    /// The bean holding the invalid value
    pub fn leaf_bean(&self) -> Option<&Arc<dyn Bean>> {
        self.leaf_bean.as_ref()
    }

    pub fn invalid_value(&self) -> &Value {
        &self.invalid_value
    }

    pub fn constraint_descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// The group being evaluated when the constraint failed
    ///
    /// Inside a redefined default sequence this is the sequence member, e.g.
    /// the bean's own type group.
    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn executable_parameters(&self) -> Option<&[Value]> {
        self.executable_parameters.as_deref()
    }

    pub fn executable_return_value(&self) -> Option<&Value> {
        self.executable_return_value.as_ref()
    }
}

impl fmt::Debug for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintViolation")
            .field("message", &self.message)
            .field("property_path", &self.property_path.to_string())
            .field("root_bean_type", &self.root_bean_type)
            .field("invalid_value", &self.invalid_value)
            .field("constraint", &self.descriptor.name())
            .field("group", &self.group)
            .finish()
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property_path.is_root() {
            write!(f, "{}: {}", self.root_bean_type, self.message)
        } else {
            write!(f, "{}: {}", self.property_path, self.message)
        }
    }
}

/// Violations of one validation call, in evaluation order
#[derive(Debug, Clone, Default)]
pub struct ConstraintViolations {
    violations: Vec<ConstraintViolation>,
}

impl ConstraintViolations {
    pub(crate) fn new(violations: Vec<ConstraintViolation>) -> Self {
        Self { violations }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintViolation> {
        self.violations.iter()
    }

    /// Violations whose rendered property path equals `path`
    pub fn for_path(&self, path: &str) -> Vec<&ConstraintViolation> {
        self.violations
            .iter()
            .filter(|v| v.property_path.to_string() == path)
            .collect()
    }

    /// Messages of all violations, in order
    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> std::result::Result<(), ConstraintViolations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ConstraintViolations {
    type Item = ConstraintViolation;
    type IntoIter = std::vec::IntoIter<ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintViolations {
    type Item = &'a ConstraintViolation;
    type IntoIter = std::slice::Iter<'a, ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ConstraintViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}
