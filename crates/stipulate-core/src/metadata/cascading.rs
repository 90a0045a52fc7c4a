//! Cascading metadata of a validated element
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::{CascadingDeclaration, ContainerElementDeclaration, DeclarationReader, ElementDeclaration};
use crate::error::{Error, Result};
use crate::group::GroupId;
use std::collections::BTreeMap;

/// Cascading flag and group conversions of an element, with one nested
/// entry per type argument that cascades
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadingMetadata {
    cascading: bool,
    group_conversions: BTreeMap<GroupId, GroupId>,
    container_type: Option<String>,
    type_arguments: BTreeMap<usize, CascadingMetadata>,
}

impl CascadingMetadata {
    pub fn non_cascading() -> Self {
        Self::default()
    }

    /// Collect the cascading declared on an element and its container elements
    pub fn from_declaration(declaration: &ElementDeclaration, owner: &str) -> Result<Self> {
        let mut metadata = Self::from_parts(&declaration.cascading, declaration.declared_type.clone(), owner)?;
        metadata.add_type_arguments(&declaration.container_elements, owner)?;
        Ok(metadata)
    }

    fn from_parts(cascading: &CascadingDeclaration, container_type: Option<String>, owner: &str) -> Result<Self> {
        let mut metadata = Self {
            cascading: cascading.cascade,
            group_conversions: BTreeMap::new(),
            container_type,
            type_arguments: BTreeMap::new(),
        };
        metadata.add_conversions(&cascading.group_conversions, owner)?;
        Ok(metadata)
    }

    fn add_type_arguments(&mut self, elements: &[ContainerElementDeclaration], owner: &str) -> Result<()> {
        for element in elements {
            let mut nested = Self::from_parts(&element.cascading, element.element_type.clone(), owner)?;
            nested.add_type_arguments(&element.nested, owner)?;
            if nested.is_empty() {
                continue;
            }
            match self.type_arguments.get_mut(&element.position) {
                Some(existing) => existing.merge(nested, owner)?,
                None => {
                    self.type_arguments.insert(element.position, nested);
                }
            }
        }
        Ok(())
    }

    fn add_conversions(&mut self, conversions: &[(GroupId, GroupId)], owner: &str) -> Result<()> {
        for (from, to) in conversions {
            match self.group_conversions.get(from) {
                Some(existing) if existing != to => {
                    return Err(Error::configuration_for(
                        owner,
                        format!(
                            "group '{}' is converted to both '{}' and '{}'",
                            from, existing, to
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    self.group_conversions.insert(from.clone(), to.clone());
                }
            }
        }
        Ok(())
    }

    /// Merge the cascading declared for the same element further up the hierarchy
    pub fn merge(&mut self, other: CascadingMetadata, owner: &str) -> Result<()> {
        self.cascading |= other.cascading;
        if self.container_type.is_none() {
            self.container_type = other.container_type;
        }
        let conversions: Vec<_> = other.group_conversions.into_iter().collect();
        self.add_conversions(&conversions, owner)?;
        for (position, nested) in other.type_arguments {
            match self.type_arguments.get_mut(&position) {
                Some(existing) => existing.merge(nested, owner)?,
                None => {
                    self.type_arguments.insert(position, nested);
                }
            }
        }
        Ok(())
    }

    /// Conversions are only meaningful on cascading elements and never start from a sequence
    pub fn check(&self, reader: &dyn DeclarationReader, owner: &str) -> Result<()> {
        if !self.cascading && !self.group_conversions.is_empty() {
            return Err(Error::configuration_for(
                owner,
                "group conversions are only allowed on cascaded elements",
            ));
        }
        for from in self.group_conversions.keys() {
            if reader.group_definition(from).is_some_and(|def| def.is_sequence()) {
                return Err(Error::configuration_for(
                    owner,
                    format!("group sequence '{}' cannot be the source of a group conversion", from),
                ));
            }
        }
        self.type_arguments
            .values()
            .try_for_each(|nested| nested.check(reader, owner))
    }

    fn is_empty(&self) -> bool {
        !self.cascading && self.group_conversions.is_empty() && self.type_arguments.is_empty()
    }

    /// Whether the element itself is marked for cascading
    pub fn is_cascading(&self) -> bool {
        self.cascading
    }

    /// Whether the element or any of its type arguments cascades
    pub fn has_cascading(&self) -> bool {
        self.cascading || self.type_arguments.values().any(CascadingMetadata::has_cascading)
    }

    /// The group to use for the cascaded value when validating `group`
    pub fn convert_group(&self, group: &GroupId) -> GroupId {
        self.group_conversions.get(group).cloned().unwrap_or_else(|| group.clone())
    }

    pub fn group_conversions(&self) -> &BTreeMap<GroupId, GroupId> {
        &self.group_conversions
    }

    /// Declared type of the value, when known
    pub fn container_type(&self) -> Option<&str> {
        self.container_type.as_deref()
    }

    pub fn type_arguments(&self) -> &BTreeMap<usize, CascadingMetadata> {
        &self.type_arguments
    }
}
