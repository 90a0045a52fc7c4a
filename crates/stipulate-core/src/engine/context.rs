//! Per-call validation state
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::factory::ValidatorShared;
use super::traversable;
use super::violation::{ConstraintViolation, ConstraintViolations};
use crate::constraint::composition::PendingViolation;
use crate::constraint::InterpolationContext;
use crate::error::Result;
use crate::group::GroupId;
use crate::metadata::MetaConstraint;
use crate::path::PropertyPath;
use crate::value::{bean_identity, Bean, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Visited beans, processed constraints and collected violations of one call
///
/// Never shared between calls or threads.
pub(crate) struct ValidationContext<'a> {
    pub(super) shared: &'a ValidatorShared,
    fail_fast: bool,
    root_bean_type: String,
    root_bean: Option<Arc<dyn Bean>>,
    executable_parameters: Option<Vec<Value>>,
    executable_return_value: Option<Value>,
    visited: HashSet<(usize, GroupId)>,
    processed: HashSet<(usize, String, usize)>,
    // Holds visited beans so their identities stay unique for the whole call
    retained: Vec<Arc<dyn Bean>>,
    violations: Vec<ConstraintViolation>,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new<S: Into<String>>(shared: &'a ValidatorShared, fail_fast: bool, root_bean_type: S) -> Self {
        Self {
            shared,
            fail_fast,
            root_bean_type: root_bean_type.into(),
            root_bean: None,
            executable_parameters: None,
            executable_return_value: None,
            visited: HashSet::new(),
            processed: HashSet::new(),
            retained: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub(crate) fn with_root_bean(mut self, bean: Arc<dyn Bean>) -> Self {
        self.root_bean = Some(bean);
        self
    }

    pub(crate) fn with_parameters(mut self, parameters: &[Value]) -> Self {
        self.executable_parameters = Some(parameters.to_vec());
        self
    }

    pub(crate) fn with_return_value(mut self, value: &Value) -> Self {
        self.executable_return_value = Some(value.clone());
        self
    }

    /// True once fail-fast mode has recorded a violation
    pub(crate) fn should_stop(&self) -> bool {
        self.fail_fast && !self.violations.is_empty()
    }

    pub(super) fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Record `(bean, group)`; false when it was already validated in this call
    pub(super) fn mark_visited(&mut self, bean: &Arc<dyn Bean>, group: &GroupId) -> bool {
        let first = self.visited.insert((bean_identity(bean), group.clone()));
        if first {
            self.retained.push(bean.clone());
        }
        first
    }

    /// Record a constraint evaluation unit; false when already evaluated in this call
    pub(super) fn mark_processed(&mut self, leaf: Option<&Arc<dyn Bean>>, unit: &str, constraint: &MetaConstraint) -> bool {
        let bean = leaf.map_or(0, bean_identity);
        self.processed
            .insert((bean, unit.to_string(), constraint.identity()))
    }

    /// Whether `property` of `bean` may be read at all
    pub(super) fn is_reachable(
        &self,
        bean: &Arc<dyn Bean>,
        property: &str,
        path_to_bean: &PropertyPath,
    ) -> Result<bool> {
        self.shared
            .traversable
            .is_reachable(bean.as_ref(), property, &self.root_bean_type, path_to_bean)
            .map_err(traversable::wrap_error(bean.as_ref(), property))
    }

    /// Whether a cascade may follow `property` of `bean`
    pub(super) fn is_cascadable(
        &self,
        bean: &Arc<dyn Bean>,
        property: &str,
        path_to_bean: &PropertyPath,
    ) -> Result<bool> {
        self.shared
            .traversable
            .is_cascadable(bean.as_ref(), property, &self.root_bean_type, path_to_bean)
            .map_err(traversable::wrap_error(bean.as_ref(), property))
    }

    pub(super) fn report(
        &mut self,
        pending: PendingViolation,
        value: &Value,
        path: &PropertyPath,
        leaf: Option<&Arc<dyn Bean>>,
        group: &GroupId,
    ) {
        let descriptor = pending.descriptor;
        let context = InterpolationContext {
            constraint: descriptor.name(),
            attributes: descriptor.attributes(),
            validated_value: value,
        };
        let message = self
            .shared
            .interpolator
            .interpolate(&pending.violation.template, &context);
        let property_path = path.extended(&pending.violation.nodes);

        log::debug!(
            "Constraint '{}' violated at '{}' of '{}': {}",
            descriptor.name(),
            property_path,
            self.root_bean_type,
            message
        );

        self.violations.push(ConstraintViolation {
            message,
            message_template: pending.violation.template,
            property_path,
            root_bean_type: self.root_bean_type.clone(),
            root_bean: self.root_bean.clone(),
            leaf_bean: leaf.cloned(),
            invalid_value: value.clone(),
            descriptor,
            group: group.clone(),
            executable_parameters: self.executable_parameters.clone(),
            executable_return_value: self.executable_return_value.clone(),
        });
    }

    pub(crate) fn into_violations(self) -> ConstraintViolations {
        ConstraintViolations::new(self.violations)
    }
}
