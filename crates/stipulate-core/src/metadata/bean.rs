//! Bean metadata aggregated over the type hierarchy
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::declaration::PropertyDeclaration;
use super::descriptor::{ConstraintDescriptor, MetaConstraint};
use super::element::{ElementBuilder, ElementMetaData};
use super::hierarchy::TypeHierarchy;
use super::location::ConstraintLocation;
use super::manager::BuildContext;
use crate::error::{Error, Result};
use crate::group::resolver::check_redefined_sequence;
use crate::group::{DefaultGroupSequenceProvider, GroupId};
use crate::value::{Accessor, Bean, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How the Default group is evaluated for a bean type
#[derive(Clone)]
pub enum DefaultGroupSequence {
    /// Default is the plain Default group
    Implicit,
    /// Default is replaced by a fixed sequence
    Static(Vec<GroupId>),
    /// Default is replaced by a sequence computed per instance
    Dynamic(Arc<dyn DefaultGroupSequenceProvider>),
}

impl DefaultGroupSequence {
    pub fn is_redefined(&self) -> bool {
        !matches!(self, DefaultGroupSequence::Implicit)
    }
}

impl fmt::Debug for DefaultGroupSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultGroupSequence::Implicit => write!(f, "Implicit"),
            DefaultGroupSequence::Static(groups) => f.debug_tuple("Static").field(groups).finish(),
            DefaultGroupSequence::Dynamic(_) => write!(f, "Dynamic"),
        }
    }
}

/// A property with the constraints of every type declaring it
#[derive(Debug, Clone)]
pub struct PropertyMetaData {
    name: String,
    accessor: Option<Accessor>,
    element: ElementMetaData,
}

impl PropertyMetaData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &ElementMetaData {
        &self.element
    }

    /// Current value of the property on `bean`
    ///
    /// The bean's own property access wins over the declared accessor.
    pub fn read(&self, bean: &dyn Bean) -> Result<Value> {
        if let Some(value) = bean.property(&self.name) {
            return Ok(value);
        }
        self.accessor
            .as_ref()
            .and_then(|accessor| accessor.read(bean))
            .ok_or_else(|| {
                Error::configuration_for(
                    bean.bean_type(),
                    format!("property '{}' cannot be read from '{}'", self.name, bean.bean_type()),
                )
            })
    }
}

/// Everything the engine needs to validate beans of one type
#[derive(Debug)]
pub struct BeanMetaData {
    bean_type: String,
    hierarchy: Vec<String>,
    type_constraints: Vec<MetaConstraint>,
    properties: Vec<PropertyMetaData>,
    property_index: HashMap<String, usize>,
    default_sequence: DefaultGroupSequence,
}

struct PropertyBuilder {
    name: String,
    accessor: Option<Accessor>,
    element: ElementBuilder,
}

impl BeanMetaData {
    pub(crate) fn build(hierarchy: &TypeHierarchy, context: &BuildContext<'_>) -> Result<Self> {
        let root = hierarchy.root();
        let bean_type = root.name.clone();
        let default_sequence = match (&root.default_sequence, &root.sequence_provider) {
            (Some(_), Some(_)) => {
                return Err(Error::configuration_for(
                    &bean_type,
                    format!(
                        "'{}' declares both a default group sequence and a sequence provider",
                        bean_type
                    ),
                ))
            }
            (Some(groups), None) => {
                check_redefined_sequence(&bean_type, groups)
                    .map_err(|message| Error::configuration_for(&bean_type, message))?;
                DefaultGroupSequence::Static(groups.clone())
            }
            (None, Some(provider)) => DefaultGroupSequence::Dynamic(provider.clone()),
            (None, None) => DefaultGroupSequence::Implicit,
        };

        let mut type_constraints = Vec::new();
        let mut builders: Vec<PropertyBuilder> = Vec::new();
        for declaration in hierarchy.types() {
            for constraint in &declaration.constraints {
                let descriptor = ConstraintDescriptor::build(constraint, context.validators)?;
                type_constraints.push(MetaConstraint::new(
                    ConstraintLocation::for_type(&declaration.name),
                    descriptor,
                ));
            }
            for property in &declaration.properties {
                add_property(&mut builders, &bean_type, &declaration.name, property, context)?;
            }
        }

        let mut properties = Vec::with_capacity(builders.len());
        let mut property_index = HashMap::with_capacity(builders.len());
        for builder in builders {
            property_index.insert(builder.name.clone(), properties.len());
            properties.push(PropertyMetaData {
                name: builder.name,
                accessor: builder.accessor,
                element: builder.element.build(context)?,
            });
        }

        log::debug!(
            "Built metadata for '{}': {} type constraint(s), {} propert(y/ies) over {} type(s)",
            bean_type,
            type_constraints.len(),
            properties.len(),
            hierarchy.types().len()
        );

        Ok(Self {
            bean_type,
            hierarchy: hierarchy.type_names(),
            type_constraints,
            properties,
            property_index,
            default_sequence,
        })
    }

    /// Metadata carrying only the default group sequence of `declaration`
    #[cfg(test)]
    pub(crate) fn implicit_for_tests(declaration: super::declaration::TypeDeclaration) -> Self {
        let default_sequence = match (declaration.default_sequence, declaration.sequence_provider) {
            (Some(groups), _) => DefaultGroupSequence::Static(groups),
            (None, Some(provider)) => DefaultGroupSequence::Dynamic(provider),
            (None, None) => DefaultGroupSequence::Implicit,
        };
        Self {
            hierarchy: vec![declaration.name.clone()],
            bean_type: declaration.name,
            type_constraints: Vec::new(),
            properties: Vec::new(),
            property_index: HashMap::new(),
            default_sequence,
        }
    }

    pub fn bean_type(&self) -> &str {
        &self.bean_type
    }

    /// Names of the declared types this metadata was aggregated from, root first
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn type_constraints(&self) -> &[MetaConstraint] {
        &self.type_constraints
    }

    pub fn properties(&self) -> &[PropertyMetaData] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMetaData> {
        self.property_index.get(name).map(|&i| &self.properties[i])
    }

    pub fn default_sequence(&self) -> &DefaultGroupSequence {
        &self.default_sequence
    }

    /// Whether validating this bean can produce violations at all
    pub fn is_constrained(&self) -> bool {
        !self.type_constraints.is_empty() || self.properties.iter().any(|p| p.element.is_constrained())
    }

    /// Whether `group` is the implicit group of this bean's type
    pub fn is_own_group(&self, group: &GroupId) -> bool {
        group.name() == self.bean_type
    }
}

fn add_property(
    builders: &mut Vec<PropertyBuilder>,
    bean_type: &str,
    declaring_type: &str,
    property: &PropertyDeclaration,
    context: &BuildContext<'_>,
) -> Result<()> {
    let index = match builders.iter().position(|b| b.name == property.name) {
        Some(index) => index,
        None => {
            builders.push(PropertyBuilder {
                name: property.name.clone(),
                accessor: None,
                element: ElementBuilder::new(bean_type),
            });
            builders.len() - 1
        }
    };
    let builder = &mut builders[index];
    if builder.accessor.is_none() {
        builder.accessor = property.accessor.clone();
    }
    let location = ConstraintLocation::for_property(declaring_type, &property.name);
    builder.element.add(&property.element, &location, context)
}
