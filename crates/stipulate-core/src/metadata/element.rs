//! Aggregated metadata of one constrained element
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::cascading::CascadingMetadata;
use super::declaration::{ContainerElementDeclaration, ElementDeclaration};
use super::descriptor::{ConstraintDescriptor, MetaConstraint};
use super::location::ConstraintLocation;
use super::manager::BuildContext;
use crate::error::Result;
use crate::extraction::ValueExtractor;
use std::fmt;
use std::sync::Arc;

/// Constraints on the elements at one type-argument position of a container
#[derive(Clone)]
pub struct ContainerElementMetaData {
    position: usize,
    container_type: Option<String>,
    element_type: Option<String>,
    extractor: Option<Arc<dyn ValueExtractor>>,
    constraints: Vec<MetaConstraint>,
    nested: Vec<ContainerElementMetaData>,
}

impl ContainerElementMetaData {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Declared container type, when known at build time
    pub fn container_type(&self) -> Option<&str> {
        self.container_type.as_deref()
    }

    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    /// Extractor resolved at build time; `None` means resolve from the runtime value
    pub fn extractor(&self) -> Option<&Arc<dyn ValueExtractor>> {
        self.extractor.as_ref()
    }

    pub fn constraints(&self) -> &[MetaConstraint] {
        &self.constraints
    }

    pub fn nested(&self) -> &[ContainerElementMetaData] {
        &self.nested
    }

    pub(crate) fn has_constraints(&self) -> bool {
        !self.constraints.is_empty() || self.nested.iter().any(Self::has_constraints)
    }
}

impl fmt::Debug for ContainerElementMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerElementMetaData")
            .field("position", &self.position)
            .field("container_type", &self.container_type)
            .field("element_type", &self.element_type)
            .field("extractor", &self.extractor.as_ref().map(|e| e.container_type().to_string()))
            .field("constraints", &self.constraints)
            .field("nested", &self.nested)
            .finish()
    }
}

/// Constraints, container element constraints and cascading of a property,
/// parameter or return value, merged over the type hierarchy
#[derive(Debug, Clone, Default)]
pub struct ElementMetaData {
    declared_type: Option<String>,
    constraints: Vec<MetaConstraint>,
    container_elements: Vec<ContainerElementMetaData>,
    cascading: CascadingMetadata,
}

impl ElementMetaData {
    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    pub fn constraints(&self) -> &[MetaConstraint] {
        &self.constraints
    }

    pub fn container_elements(&self) -> &[ContainerElementMetaData] {
        &self.container_elements
    }

    pub fn cascading(&self) -> &CascadingMetadata {
        &self.cascading
    }

    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
            || self
                .container_elements
                .iter()
                .any(ContainerElementMetaData::has_constraints)
    }

    /// Anything to evaluate or cascade into
    pub fn is_constrained(&self) -> bool {
        self.has_constraints() || self.cascading.has_cascading()
    }

    /// Declared type of the elements at `position`, from container element
    /// declarations or type-argument cascading
    pub fn element_type(&self, position: usize) -> Option<&str> {
        self.container_elements
            .iter()
            .find(|e| e.position == position)
            .and_then(ContainerElementMetaData::element_type)
            .or_else(|| {
                self.cascading
                    .type_arguments()
                    .get(&position)
                    .and_then(CascadingMetadata::container_type)
            })
    }
}

/// Accumulates the declarations of one element found along the hierarchy
pub(crate) struct ElementBuilder {
    owner: String,
    declared_type: Option<String>,
    constraints: Vec<MetaConstraint>,
    container_elements: Vec<ContainerElementBuilder>,
    cascading: CascadingMetadata,
}

struct ContainerElementBuilder {
    position: usize,
    element_type: Option<String>,
    constraints: Vec<MetaConstraint>,
    nested: Vec<ContainerElementBuilder>,
}

impl ElementBuilder {
    /// `owner` is the bean type the element is aggregated for
    pub(crate) fn new<S: Into<String>>(owner: S) -> Self {
        Self {
            owner: owner.into(),
            declared_type: None,
            constraints: Vec::new(),
            container_elements: Vec::new(),
            cascading: CascadingMetadata::non_cascading(),
        }
    }

    /// Add the declaration found at `location`
    pub(crate) fn add(
        &mut self,
        declaration: &ElementDeclaration,
        location: &ConstraintLocation,
        context: &BuildContext<'_>,
    ) -> Result<()> {
        if self.declared_type.is_none() {
            self.declared_type = declaration.declared_type.clone();
        }
        for constraint in &declaration.constraints {
            let descriptor = ConstraintDescriptor::build(constraint, context.validators)?;
            self.constraints.push(MetaConstraint::new(location.clone(), descriptor));
        }
        add_container_elements(&mut self.container_elements, &declaration.container_elements, location, context)?;

        let cascading = CascadingMetadata::from_declaration(declaration, &self.owner)?;
        self.cascading.merge(cascading, &self.owner)
    }

    pub(crate) fn build(self, context: &BuildContext<'_>) -> Result<ElementMetaData> {
        self.cascading.check(context.reader, &self.owner)?;
        check_type_argument_extractors(&self.cascading, context)?;

        let container_type = self.declared_type.as_deref();
        let container_elements = self
            .container_elements
            .into_iter()
            .map(|element| element.build(container_type, context))
            .collect::<Result<Vec<_>>>()?;

        Ok(ElementMetaData {
            declared_type: self.declared_type,
            constraints: self.constraints,
            container_elements,
            cascading: self.cascading,
        })
    }
}

fn add_container_elements(
    builders: &mut Vec<ContainerElementBuilder>,
    declarations: &[ContainerElementDeclaration],
    location: &ConstraintLocation,
    context: &BuildContext<'_>,
) -> Result<()> {
    for declaration in declarations {
        let index = match builders.iter().position(|b| b.position == declaration.position) {
            Some(index) => index,
            None => {
                builders.push(ContainerElementBuilder {
                    position: declaration.position,
                    element_type: None,
                    constraints: Vec::new(),
                    nested: Vec::new(),
                });
                builders.len() - 1
            }
        };
        let builder = &mut builders[index];
        if builder.element_type.is_none() {
            builder.element_type = declaration.element_type.clone();
        }

        let element_location = location.for_container_element(declaration.position);
        for constraint in &declaration.constraints {
            let descriptor = ConstraintDescriptor::build(constraint, context.validators)?;
            builder
                .constraints
                .push(MetaConstraint::new(element_location.clone(), descriptor));
        }
        add_container_elements(&mut builder.nested, &declaration.nested, &element_location, context)?;
    }
    Ok(())
}

impl ContainerElementBuilder {
    fn build(self, container_type: Option<&str>, context: &BuildContext<'_>) -> Result<ContainerElementMetaData> {
        let extractor = match container_type {
            Some(container_type) => Some(context.extractors.resolve(container_type, self.position)?),
            None => None,
        };
        let element_type = self.element_type;
        let nested = self
            .nested
            .into_iter()
            .map(|nested| nested.build(element_type.as_deref(), context))
            .collect::<Result<Vec<_>>>()?;

        Ok(ContainerElementMetaData {
            position: self.position,
            container_type: container_type.map(str::to_string),
            element_type,
            extractor,
            constraints: self.constraints,
            nested,
        })
    }
}

/// Fail at build time when a declared container has no usable extractor for a cascading type argument
fn check_type_argument_extractors(cascading: &CascadingMetadata, context: &BuildContext<'_>) -> Result<()> {
    for (position, nested) in cascading.type_arguments() {
        if let Some(container_type) = cascading.container_type() {
            context.extractors.resolve(container_type, *position)?;
        }
        check_type_argument_extractors(nested, context)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::DefaultConstraintValidatorFactory;
    use crate::config::MethodValidationConfig;
    use crate::extraction::ValueExtractorRegistry;
    use crate::metadata::{ConstraintDeclaration, Declarations, PropertyDeclaration};

    struct Fixture {
        reader: Declarations,
        validators: DefaultConstraintValidatorFactory,
        extractors: ValueExtractorRegistry,
        method_validation: MethodValidationConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                reader: Declarations::new(),
                validators: DefaultConstraintValidatorFactory::new(),
                extractors: ValueExtractorRegistry::new(),
                method_validation: MethodValidationConfig::default(),
            }
        }

        fn context(&self) -> BuildContext<'_> {
            BuildContext {
                reader: &self.reader,
                validators: &self.validators,
                extractors: &self.extractors,
                method_validation: &self.method_validation,
            }
        }
    }

    #[test]
    fn test_merges_constraints_and_container_elements() {
        let fixture = Fixture::new();
        let context = fixture.context();

        let own = PropertyDeclaration::new("tags")
            .declared_type("List")
            .constraint(ConstraintDeclaration::size(1, 5))
            .container_element(ContainerElementDeclaration::new(0).constraint(ConstraintDeclaration::not_blank()));
        let inherited = PropertyDeclaration::new("tags")
            .constraint(ConstraintDeclaration::not_null())
            .container_element(ContainerElementDeclaration::new(0).constraint(ConstraintDeclaration::size(1, 10)));

        let mut builder = ElementBuilder::new("Post");
        builder
            .add(&own.element, &ConstraintLocation::for_property("Post", "tags"), &context)
            .unwrap();
        builder
            .add(&inherited.element, &ConstraintLocation::for_property("Entry", "tags"), &context)
            .unwrap();
        let element = builder.build(&context).unwrap();

        assert_eq!(element.constraints().len(), 2);
        assert_eq!(element.container_elements().len(), 1);
        let tags = &element.container_elements()[0];
        assert_eq!(tags.constraints().len(), 2);
        assert_eq!(tags.extractor().map(|e| e.container_type()), Some("List"));
        assert_eq!(
            tags.constraints()[1].location().declaring_type(),
            "Entry"
        );
    }

    #[test]
    fn test_unknown_container_type_fails_at_build() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let declaration = PropertyDeclaration::new("amount")
            .declared_type("Money")
            .container_element(ContainerElementDeclaration::new(0).constraint(ConstraintDeclaration::not_null()));

        let mut builder = ElementBuilder::new("Order");
        builder
            .add(&declaration.element, &ConstraintLocation::for_property("Order", "amount"), &context)
            .unwrap();
        assert!(builder.build(&context).is_err());
    }

    #[test]
    fn test_element_type_lookup() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let declaration = PropertyDeclaration::new("lines")
            .declared_type("Map")
            .container_element(ContainerElementDeclaration::new(1).element_type("Line").valid());

        let mut builder = ElementBuilder::new("Order");
        builder
            .add(&declaration.element, &ConstraintLocation::for_property("Order", "lines"), &context)
            .unwrap();
        let element = builder.build(&context).unwrap();
        assert_eq!(element.element_type(1), Some("Line"));
        assert!(element.is_constrained());
        assert!(!element.has_constraints());
    }
}
