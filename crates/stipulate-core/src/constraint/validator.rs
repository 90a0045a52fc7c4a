//! Constraint validator contract and the per-evaluation context
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::metadata::Attributes;
use crate::path::{ElementNode, PathNode};
use crate::value::Value;

/// Decides whether a single value satisfies a constraint
///
/// Validators are instantiated once per constraint occurrence, initialized
/// with the occurrence's attributes, and shared across threads afterwards.
pub trait ConstraintValidator: Send + Sync {
    /// Configure the validator from the constraint attributes
    fn initialize(&mut self, _attributes: &Attributes) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether this validator handles values of the runtime type of `value`
    fn accepts(&self, _value: &Value) -> bool {
        true
    }

    fn is_valid(&self, value: &Value, context: &mut ConstraintValidatorContext) -> anyhow::Result<bool>;
}

/// A violation built by a validator instead of (or next to) the default one
#[derive(Debug, Clone, PartialEq)]
pub struct CustomViolation {
    pub template: String,
    /// Nodes appended to the path of the validated value
    pub nodes: Vec<PathNode>,
}

/// Lets a validator replace or extend the violations it reports
#[derive(Debug)]
pub struct ConstraintValidatorContext {
    default_template: String,
    default_disabled: bool,
    custom: Vec<CustomViolation>,
}

impl ConstraintValidatorContext {
    pub(crate) fn new<S: Into<String>>(default_template: S) -> Self {
        Self {
            default_template: default_template.into(),
            default_disabled: false,
            custom: Vec::new(),
        }
    }

    pub fn default_message_template(&self) -> &str {
        &self.default_template
    }

    /// Suppress the violation carrying the constraint's own template
    pub fn disable_default_constraint_violation(&mut self) {
        self.default_disabled = true;
    }

    /// Start a custom violation; it is only recorded once added
    pub fn build_violation<S: Into<String>>(&mut self, template: S) -> ViolationBuilder<'_> {
        ViolationBuilder {
            context: self,
            violation: CustomViolation {
                template: template.into(),
                nodes: Vec::new(),
            },
        }
    }

    /// Violations to report when the validator returned `false`
    pub(crate) fn into_violations(self) -> Vec<CustomViolation> {
        let mut violations = Vec::with_capacity(self.custom.len() + 1);
        if !self.default_disabled {
            violations.push(CustomViolation {
                template: self.default_template,
                nodes: Vec::new(),
            });
        }
        violations.extend(self.custom);
        violations
    }
}

/// Builder returned by [`ConstraintValidatorContext::build_violation`]
pub struct ViolationBuilder<'a> {
    context: &'a mut ConstraintValidatorContext,
    violation: CustomViolation,
}

impl ViolationBuilder<'_> {
    pub fn add_property_node<S: Into<String>>(mut self, name: S) -> Self {
        self.violation.nodes.push(PathNode::Property(name.into()));
        self
    }

    pub fn add_element_node(mut self, node: ElementNode) -> Self {
        if node != ElementNode::Single {
            self.violation.nodes.push(PathNode::Element(node));
        }
        self
    }

    pub fn add_constraint_violation(self) {
        self.context.custom.push(self.violation);
    }
}

/// Adapter turning a predicate into a validator
pub struct FnValidator<F> {
    predicate: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> ConstraintValidator for FnValidator<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok((self.predicate)(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_violation_reported() {
        let context = ConstraintValidatorContext::new("must not be null");
        let violations = context.into_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].template, "must not be null");
        assert!(violations[0].nodes.is_empty());
    }

    #[test]
    fn test_custom_violation_replaces_default() {
        let mut context = ConstraintValidatorContext::new("{Range.message}");
        context.disable_default_constraint_violation();
        context
            .build_violation("end before start")
            .add_property_node("end")
            .add_constraint_violation();
        // never added
        let _ = context.build_violation("dropped");

        let violations = context.into_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].nodes, vec![PathNode::Property("end".to_string())]);
    }

    #[test]
    fn test_disabled_without_custom_reports_nothing() {
        let mut context = ConstraintValidatorContext::new("x");
        context.disable_default_constraint_violation();
        assert!(context.into_violations().is_empty());
    }

    #[test]
    fn test_fn_validator() {
        let positive = FnValidator::new(|v: &Value| v.as_f64().map_or(true, |n| n > 0.0));
        let mut context = ConstraintValidatorContext::new("x");
        assert!(positive.is_valid(&Value::Int(3), &mut context).unwrap());
        assert!(!positive.is_valid(&Value::Int(-3), &mut context).unwrap());
    }
}
