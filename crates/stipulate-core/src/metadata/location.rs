//! Where a constraint is declared
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::ExecutableSignature;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    Type,
    Property,
    Parameter,
    CrossParameter,
    ReturnValue,
    ContainerElement,
}

/// Declaration site of a constraint
///
/// Two locations are equal when kind, declaring type and member match. The
/// member identifier covers the parameter index and, for container
/// elements, the chain of type-argument positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintLocation {
    kind: LocationKind,
    declaring_type: String,
    member: String,
    parameter_index: Option<usize>,
    type_arguments: Vec<usize>,
}

impl ConstraintLocation {
    fn new(kind: LocationKind, declaring_type: &str, member: String, parameter_index: Option<usize>) -> Self {
        Self {
            kind,
            declaring_type: declaring_type.to_string(),
            member,
            parameter_index,
            type_arguments: Vec::new(),
        }
    }

    pub fn for_type(declaring_type: &str) -> Self {
        Self::new(LocationKind::Type, declaring_type, declaring_type.to_string(), None)
    }

    pub fn for_property(declaring_type: &str, property: &str) -> Self {
        Self::new(LocationKind::Property, declaring_type, property.to_string(), None)
    }

    pub fn for_parameter(declaring_type: &str, executable: &ExecutableSignature, index: usize) -> Self {
        Self::new(LocationKind::Parameter, declaring_type, executable.to_string(), Some(index))
    }

    pub fn for_cross_parameter(declaring_type: &str, executable: &ExecutableSignature) -> Self {
        Self::new(LocationKind::CrossParameter, declaring_type, executable.to_string(), None)
    }

    pub fn for_return_value(declaring_type: &str, executable: &ExecutableSignature) -> Self {
        Self::new(LocationKind::ReturnValue, declaring_type, executable.to_string(), None)
    }

    /// Location of the elements at type-argument `position` of the value at `self`
    pub fn for_container_element(&self, position: usize) -> Self {
        let mut location = self.clone();
        location.kind = LocationKind::ContainerElement;
        location.type_arguments.push(position);
        location
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Property name, executable signature, or type name for type-level constraints
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter_index
    }

    pub fn type_arguments(&self) -> &[usize] {
        &self.type_arguments
    }
}

impl fmt::Display for ConstraintLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}#{}", self.kind, self.declaring_type, self.member)?;
        if let Some(index) = self.parameter_index {
            write!(f, "[arg{}]", index)?;
        }
        for position in &self.type_arguments {
            write!(f, "<{}>", position)?;
        }
        Ok(())
    }
}
