//! Resolved constraint descriptors
//!
//! A descriptor is the immutable, validated form of a [`ConstraintDeclaration`]:
//! groups defaulted, validators instantiated and initialized, composing
//! constraints resolved recursively.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::{Attributes, CompositionType, ConstraintDeclaration};
use super::location::ConstraintLocation;
use crate::constraint::{ConstraintValidator, ConstraintValidatorFactory};
use crate::error::{Error, Result};
use crate::group::GroupId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub struct ConstraintDescriptor {
    name: String,
    message_template: String,
    groups: BTreeSet<GroupId>,
    payload: BTreeSet<String>,
    attributes: Attributes,
    validators: Vec<Arc<dyn ConstraintValidator>>,
    composing: Vec<Arc<ConstraintDescriptor>>,
    composition: CompositionType,
    report_as_single_violation: bool,
}

impl ConstraintDescriptor {
    /// Resolve a top-level declaration
    pub fn build(
        declaration: &ConstraintDeclaration,
        factory: &dyn ConstraintValidatorFactory,
    ) -> Result<Self> {
        let groups = if declaration.groups.is_empty() {
            BTreeSet::from([GroupId::default_group()])
        } else {
            declaration.groups.iter().cloned().collect()
        };
        let payload = declaration.payload.iter().cloned().collect();
        Self::build_with(declaration, groups, payload, factory, &mut Vec::new())
    }

    /// Composing constraints inherit the groups of the composite and add to its payload
    fn build_with(
        declaration: &ConstraintDeclaration,
        groups: BTreeSet<GroupId>,
        mut payload: BTreeSet<String>,
        factory: &dyn ConstraintValidatorFactory,
        composing_stack: &mut Vec<String>,
    ) -> Result<Self> {
        if composing_stack.contains(&declaration.name) {
            return Err(Error::configuration(format!(
                "constraint '{}' is composed of itself",
                declaration.name
            )));
        }
        if declaration.validators.is_empty() && declaration.composing.is_empty() {
            return Err(Error::configuration(format!(
                "constraint '{}' has neither a validator nor composing constraints",
                declaration.name
            )));
        }
        payload.extend(declaration.payload.iter().cloned());

        let mut validators: Vec<Arc<dyn ConstraintValidator>> = Vec::with_capacity(declaration.validators.len());
        for id in &declaration.validators {
            let mut validator = factory.create(id)?;
            validator.initialize(&declaration.attributes).map_err(|e| {
                Error::configuration(format!(
                    "validator '{}' of constraint '{}' rejected its attributes: {:#}",
                    id, declaration.name, e
                ))
            })?;
            validators.push(Arc::from(validator));
        }

        composing_stack.push(declaration.name.clone());
        let composing = declaration
            .composing
            .iter()
            .map(|part| {
                Self::build_with(part, groups.clone(), payload.clone(), factory, composing_stack).map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;
        composing_stack.pop();

        Ok(Self {
            name: declaration.name.clone(),
            message_template: declaration.message.clone(),
            groups,
            payload,
            attributes: declaration.attributes.clone(),
            validators,
            composing,
            composition: declaration.composition,
            report_as_single_violation: declaration.report_as_single_violation,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    pub fn groups(&self) -> &BTreeSet<GroupId> {
        &self.groups
    }

    pub fn payload(&self) -> &BTreeSet<String> {
        &self.payload
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn validators(&self) -> &[Arc<dyn ConstraintValidator>] {
        &self.validators
    }

    pub fn composing(&self) -> &[Arc<ConstraintDescriptor>] {
        &self.composing
    }

    pub fn composition(&self) -> CompositionType {
        self.composition
    }

    pub fn is_report_as_single_violation(&self) -> bool {
        self.report_as_single_violation
    }

    pub fn is_in_default_group(&self) -> bool {
        self.groups.iter().any(GroupId::is_default)
    }
}

impl fmt::Debug for ConstraintDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintDescriptor")
            .field("name", &self.name)
            .field("message_template", &self.message_template)
            .field("groups", &self.groups)
            .field("payload", &self.payload)
            .field("attributes", &self.attributes)
            .field("validators", &self.validators.len())
            .field("composing", &self.composing)
            .field("composition", &self.composition)
            .field("report_as_single_violation", &self.report_as_single_violation)
            .finish()
    }
}

/// A descriptor bound to the element it constrains
#[derive(Debug, Clone)]
pub struct MetaConstraint {
    location: ConstraintLocation,
    descriptor: Arc<ConstraintDescriptor>,
}

impl MetaConstraint {
    pub fn new(location: ConstraintLocation, descriptor: ConstraintDescriptor) -> Self {
        Self {
            location,
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn location(&self) -> &ConstraintLocation {
        &self.location
    }

    pub fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        &self.descriptor
    }

    /// Stable identity of this constraint within the metadata it belongs to
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.descriptor) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::DefaultConstraintValidatorFactory;

    #[test]
    fn test_groups_default_and_inherit() {
        let factory = DefaultConstraintValidatorFactory::new();
        let declaration = ConstraintDeclaration::composed("Code", CompositionType::And)
            .group("Billing")
            .payload("severity.error")
            .composing(ConstraintDeclaration::not_null().payload("inner"))
            .composing(ConstraintDeclaration::size(1, 4));

        let descriptor = ConstraintDescriptor::build(&declaration, &factory).unwrap();
        assert!(!descriptor.is_in_default_group());
        assert_eq!(descriptor.composing().len(), 2);
        for part in descriptor.composing() {
            assert_eq!(part.groups(), descriptor.groups());
            assert!(part.payload().contains("severity.error"));
        }
        assert!(descriptor.composing()[0].payload().contains("inner"));

        let plain = ConstraintDescriptor::build(&ConstraintDeclaration::not_null(), &factory).unwrap();
        assert!(plain.is_in_default_group());
        assert_eq!(plain.validators().len(), 1);
    }

    #[test]
    fn test_invalid_declarations_rejected() {
        let factory = DefaultConstraintValidatorFactory::new();

        let empty = ConstraintDeclaration::composed("Nothing", CompositionType::And);
        assert!(ConstraintDescriptor::build(&empty, &factory).is_err());

        let unknown = ConstraintDeclaration::new("Unregistered");
        assert!(ConstraintDescriptor::build(&unknown, &factory).unwrap_err().is_configuration_error());

        let bad_attributes = ConstraintDeclaration::size(3, 1);
        assert!(ConstraintDescriptor::build(&bad_attributes, &factory).is_err());

        let recursive = ConstraintDeclaration::composed("Loop", CompositionType::And)
            .composing(ConstraintDeclaration::composed("Loop", CompositionType::And));
        assert!(ConstraintDescriptor::build(&recursive, &factory).is_err());
    }
}
