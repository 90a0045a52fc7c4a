//! Raw constraint declarations consumed by the metadata aggregator
//!
//! This is the boundary to whatever authors declarations (builder code,
//! generated code, external mapping files). The aggregator only sees these
//! plain records through a [`DeclarationReader`].
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::group::{DefaultGroupSequenceProvider, GroupDefinition, GroupId};
use crate::value::Accessor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constraint attributes, e.g. `min`/`max` of a size constraint
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Boolean operator combining a composed constraint's parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompositionType {
    /// Fails if any part fails
    #[default]
    And,
    /// Fails only if every part fails
    Or,
    /// Fails if any part passes
    AllFalse,
}

/// One declared constraint occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDeclaration {
    /// Constraint type name
    pub name: String,
    /// Validator implementation ids, resolved by the validator factory
    pub validators: Vec<String>,
    /// Message template handed to the interpolator
    pub message: String,
    /// Target groups; empty means the Default group
    pub groups: Vec<GroupId>,
    /// Opaque payload markers
    pub payload: Vec<String>,
    pub attributes: Attributes,
    /// Composed sub-constraints
    pub composing: Vec<ConstraintDeclaration>,
    pub composition: CompositionType,
    pub report_as_single_violation: bool,
}

impl ConstraintDeclaration {
    /// A constraint validated by the validator registered under its own name
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Self {
            validators: vec![name.clone()],
            message: format!("{{{}.message}}", name),
            name,
            groups: Vec::new(),
            payload: Vec::new(),
            attributes: Attributes::new(),
            composing: Vec::new(),
            composition: CompositionType::And,
            report_as_single_violation: false,
        }
    }

    /// A purely composed constraint without a validator of its own
    pub fn composed<S: Into<String>>(name: S, composition: CompositionType) -> Self {
        let mut declaration = Self::new(name);
        declaration.validators.clear();
        declaration.composition = composition;
        declaration
    }

    /// Replace the validator ids
    pub fn validated_by<I, S>(mut self, validators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validators = validators.into_iter().map(Into::into).collect();
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    pub fn group<G: Into<GroupId>>(mut self, group: G) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn payload<S: Into<String>>(mut self, payload: S) -> Self {
        self.payload.push(payload.into());
        self
    }

    pub fn attribute<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn composing(mut self, part: ConstraintDeclaration) -> Self {
        self.composing.push(part);
        self
    }

    pub fn report_as_single_violation(mut self) -> Self {
        self.report_as_single_violation = true;
        self
    }

    pub fn not_null() -> Self {
        Self::new("NotNull").message("must not be null")
    }

    pub fn null() -> Self {
        Self::new("Null").message("must be null")
    }

    pub fn not_empty() -> Self {
        Self::new("NotEmpty").message("must not be empty")
    }

    pub fn not_blank() -> Self {
        Self::new("NotBlank").message("must not be blank")
    }

    pub fn size(min: i64, max: i64) -> Self {
        Self::new("Size")
            .message("size must be between {min} and {max}")
            .attribute("min", min)
            .attribute("max", max)
    }

    pub fn min(value: i64) -> Self {
        Self::new("Min")
            .message("must be greater than or equal to {value}")
            .attribute("value", value)
    }

    pub fn max(value: i64) -> Self {
        Self::new("Max")
            .message("must be less than or equal to {value}")
            .attribute("value", value)
    }

    pub fn pattern<S: Into<String>>(regexp: S) -> Self {
        Self::new("Pattern")
            .message("must match \"{regexp}\"")
            .attribute("regexp", regexp.into())
    }

    pub fn assert_true() -> Self {
        Self::new("AssertTrue").message("must be true")
    }

    pub fn assert_false() -> Self {
        Self::new("AssertFalse").message("must be false")
    }
}

/// Cascading flag plus group conversions of one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadingDeclaration {
    pub cascade: bool,
    /// `(from, to)` pairs applied when crossing into the cascaded value
    pub group_conversions: Vec<(GroupId, GroupId)>,
}

/// Constraints on the elements of a container at one type-argument position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerElementDeclaration {
    /// Type-argument position (`Map`: 0 = keys, 1 = values)
    pub position: usize,
    /// Declared type of the elements, required for deeper nesting
    pub element_type: Option<String>,
    pub constraints: Vec<ConstraintDeclaration>,
    pub cascading: CascadingDeclaration,
    pub nested: Vec<ContainerElementDeclaration>,
}

impl ContainerElementDeclaration {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn element_type<S: Into<String>>(mut self, element_type: S) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    pub fn constraint(mut self, constraint: ConstraintDeclaration) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn valid(mut self) -> Self {
        self.cascading.cascade = true;
        self
    }

    pub fn convert_group<F, T>(mut self, from: F, to: T) -> Self
    where
        F: Into<GroupId>,
        T: Into<GroupId>,
    {
        self.cascading.group_conversions.push((from.into(), to.into()));
        self
    }

    pub fn nested(mut self, nested: ContainerElementDeclaration) -> Self {
        self.nested.push(nested);
        self
    }

    fn has_constraints(&self) -> bool {
        !self.constraints.is_empty() || self.nested.iter().any(Self::has_constraints)
    }

    fn is_cascading(&self) -> bool {
        self.cascading.cascade || self.nested.iter().any(Self::is_cascading)
    }
}

/// Constraints and cascading of a property, parameter or return value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementDeclaration {
    /// Declared container type or bean type of the element
    pub declared_type: Option<String>,
    pub constraints: Vec<ConstraintDeclaration>,
    pub cascading: CascadingDeclaration,
    pub container_elements: Vec<ContainerElementDeclaration>,
}

impl ElementDeclaration {
    /// Any constraint at this element or inside its container elements
    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
            || self
                .container_elements
                .iter()
                .any(ContainerElementDeclaration::has_constraints)
    }

    /// Cascading declared at this element or any of its container elements
    pub fn is_cascading(&self) -> bool {
        self.cascading.cascade
            || self
                .container_elements
                .iter()
                .any(ContainerElementDeclaration::is_cascading)
    }

    /// Same constraints and cascading, ignoring the declared type
    pub fn is_equally_constrained(&self, other: &ElementDeclaration) -> bool {
        self.constraints == other.constraints
            && self.cascading == other.cascading
            && self.container_elements == other.container_elements
    }
}

macro_rules! element_builders {
    ($ty:ty, $field:ident) => {
        impl $ty {
            pub fn declared_type<S: Into<String>>(mut self, declared_type: S) -> Self {
                self.$field.declared_type = Some(declared_type.into());
                self
            }

            pub fn constraint(mut self, constraint: ConstraintDeclaration) -> Self {
                self.$field.constraints.push(constraint);
                self
            }

            /// Mark the element as cascading
            pub fn valid(mut self) -> Self {
                self.$field.cascading.cascade = true;
                self
            }

            pub fn convert_group<F, T>(mut self, from: F, to: T) -> Self
            where
                F: Into<GroupId>,
                T: Into<GroupId>,
            {
                self.$field
                    .cascading
                    .group_conversions
                    .push((from.into(), to.into()));
                self
            }

            pub fn container_element(mut self, element: ContainerElementDeclaration) -> Self {
                self.$field.container_elements.push(element);
                self
            }
        }
    };
}

/// A constrained property (field or getter)
#[derive(Debug, Clone)]
pub struct PropertyDeclaration {
    pub name: String,
    /// Fallback accessor when the bean does not answer the read itself
    pub accessor: Option<Accessor>,
    pub element: ElementDeclaration,
}

impl PropertyDeclaration {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            accessor: None,
            element: ElementDeclaration::default(),
        }
    }

    pub fn accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }
}

element_builders!(PropertyDeclaration, element);

/// A constrained executable parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDeclaration {
    pub name: String,
    pub element: ElementDeclaration,
}

impl ParameterDeclaration {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            element: ElementDeclaration::default(),
        }
    }
}

element_builders!(ParameterDeclaration, element);

/// Method or constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutableKind {
    Method,
    Constructor,
}

/// Name plus parameter types; identifies overriding methods across a hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutableSignature {
    pub kind: ExecutableKind,
    pub name: String,
    pub parameter_types: Vec<String>,
}

impl ExecutableSignature {
    pub fn method<N, I, S>(name: N, parameter_types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ExecutableKind::Method,
            name: name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn constructor<N, I, S>(type_name: N, parameter_types: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ExecutableKind::Constructor,
            name: type_name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_types.len()
    }
}

impl fmt::Display for ExecutableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(", "))
    }
}

/// A constrained method or constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableDeclaration {
    pub signature: ExecutableSignature,
    pub parameters: Vec<ParameterDeclaration>,
    pub cross_parameter_constraints: Vec<ConstraintDeclaration>,
    pub return_value: ElementDeclaration,
    pub returns_void: bool,
}

impl ExecutableDeclaration {
    pub fn new(signature: ExecutableSignature) -> Self {
        Self {
            signature,
            parameters: Vec::new(),
            cross_parameter_constraints: Vec::new(),
            return_value: ElementDeclaration::default(),
            returns_void: false,
        }
    }

    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn cross_parameter(mut self, constraint: ConstraintDeclaration) -> Self {
        self.cross_parameter_constraints.push(constraint);
        self
    }

    pub fn returns(mut self, return_value: ElementDeclaration) -> Self {
        self.return_value = return_value;
        self
    }

    pub fn returning_constraint(mut self, constraint: ConstraintDeclaration) -> Self {
        self.return_value.constraints.push(constraint);
        self
    }

    /// Mark the return value as cascading
    pub fn valid_return(mut self) -> Self {
        self.return_value.cascading.cascade = true;
        self
    }

    pub fn void(mut self) -> Self {
        self.returns_void = true;
        self
    }

    /// Parameter or cross-parameter constraints, or cascaded parameters
    pub fn has_parameter_constraints(&self) -> bool {
        !self.cross_parameter_constraints.is_empty()
            || self
                .parameters
                .iter()
                .any(|p| p.element.has_constraints() || p.element.is_cascading())
    }

    pub fn is_equally_parameter_constrained(&self, other: &ExecutableDeclaration) -> bool {
        if self.cross_parameter_constraints != other.cross_parameter_constraints {
            return false;
        }
        let count = self.parameters.len().max(other.parameters.len());
        let empty = ElementDeclaration::default();
        (0..count).all(|i| {
            let mine = self.parameters.get(i).map(|p| &p.element).unwrap_or(&empty);
            let theirs = other.parameters.get(i).map(|p| &p.element).unwrap_or(&empty);
            mine.is_equally_constrained(theirs)
        })
    }

    pub fn has_return_value_constraints(&self) -> bool {
        self.return_value.has_constraints() || self.return_value.is_cascading()
    }
}

/// All declarations of one type
#[derive(Clone)]
pub struct TypeDeclaration {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    /// Type-level constraints, validated against the bean itself
    pub constraints: Vec<ConstraintDeclaration>,
    pub properties: Vec<PropertyDeclaration>,
    pub executables: Vec<ExecutableDeclaration>,
    /// Statically redefined default group sequence
    pub default_sequence: Option<Vec<GroupId>>,
    /// Dynamically computed default group sequence
    pub sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl TypeDeclaration {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            constraints: Vec::new(),
            properties: Vec::new(),
            executables: Vec::new(),
            default_sequence: None,
            sequence_provider: None,
        }
    }

    pub fn extends<S: Into<String>>(mut self, superclass: S) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements<S: Into<String>>(mut self, interface: S) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn constraint(mut self, constraint: ConstraintDeclaration) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }

    pub fn executable(mut self, executable: ExecutableDeclaration) -> Self {
        self.executables.push(executable);
        self
    }

    pub fn with_default_sequence<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<GroupId>,
    {
        self.default_sequence = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sequence_provider<P>(mut self, provider: P) -> Self
    where
        P: DefaultGroupSequenceProvider + 'static,
    {
        self.sequence_provider = Some(Arc::new(provider));
        self
    }

    /// Declarations of the executable with the given signature, if any
    pub fn executable_declaration(&self, signature: &ExecutableSignature) -> Option<&ExecutableDeclaration> {
        self.executables.iter().find(|e| e.signature == *signature)
    }
}

impl fmt::Debug for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDeclaration")
            .field("name", &self.name)
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("constraints", &self.constraints.len())
            .field("properties", &self.properties.len())
            .field("executables", &self.executables.len())
            .field("default_sequence", &self.default_sequence)
            .field("sequence_provider", &self.sequence_provider.is_some())
            .finish()
    }
}

/// Source of raw declarations
pub trait DeclarationReader: Send + Sync {
    /// Declarations of `type_name`, `None` for unknown types
    fn type_declaration(&self, type_name: &str) -> Option<Arc<TypeDeclaration>>;

    /// Definition of a group, `None` for plain groups without parents
    fn group_definition(&self, group: &GroupId) -> Option<GroupDefinition>;
}

/// In-memory declaration registry
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    types: HashMap<String, Arc<TypeDeclaration>>,
    groups: HashMap<GroupId, GroupDefinition>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, declaration: TypeDeclaration) -> Self {
        self.add_type(declaration);
        self
    }

    pub fn with_group(mut self, definition: GroupDefinition) -> Self {
        self.add_group(definition);
        self
    }

    /// Register or replace a type declaration
    pub fn add_type(&mut self, declaration: TypeDeclaration) {
        self.types
            .insert(declaration.name.clone(), Arc::new(declaration));
    }

    pub fn add_group(&mut self, definition: GroupDefinition) {
        self.groups.insert(definition.id.clone(), definition);
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl DeclarationReader for Declarations {
    fn type_declaration(&self, type_name: &str) -> Option<Arc<TypeDeclaration>> {
        self.types.get(type_name).cloned()
    }

    fn group_definition(&self, group: &GroupId) -> Option<GroupDefinition> {
        self.groups.get(group).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_declarations_carry_attributes() {
        let size = ConstraintDeclaration::size(2, 8);
        assert_eq!(size.validators, vec!["Size".to_string()]);
        assert_eq!(size.attributes["min"], serde_json::json!(2));
        assert_eq!(size.attributes["max"], serde_json::json!(8));

        let composed = ConstraintDeclaration::composed("Code", CompositionType::Or);
        assert!(composed.validators.is_empty());
        assert_eq!(composed.message, "{Code.message}");
    }

    #[test]
    fn test_parameter_constraint_comparison() {
        let signature = ExecutableSignature::method("rename", ["String"]);
        let plain = ExecutableDeclaration::new(signature.clone()).parameter(ParameterDeclaration::new("name"));
        let constrained = ExecutableDeclaration::new(signature.clone())
            .parameter(ParameterDeclaration::new("name").constraint(ConstraintDeclaration::not_null()));
        let cascaded = ExecutableDeclaration::new(signature).parameter(ParameterDeclaration::new("name").valid());

        assert!(!plain.has_parameter_constraints());
        assert!(constrained.has_parameter_constraints());
        assert!(cascaded.has_parameter_constraints());
        assert!(!constrained.is_equally_parameter_constrained(&plain));
        assert!(constrained.is_equally_parameter_constrained(&constrained.clone()));
    }

    #[test]
    fn test_container_element_flags() {
        let element = ElementDeclaration {
            container_elements: vec![ContainerElementDeclaration::new(1)
                .nested(ContainerElementDeclaration::new(0).valid())],
            ..ElementDeclaration::default()
        };
        assert!(element.is_cascading());
        assert!(!element.has_constraints());
    }

    #[test]
    fn test_signature_display() {
        let signature = ExecutableSignature::method("place", ["Item", "int"]);
        assert_eq!(signature.to_string(), "place(Item, int)");
        assert_eq!(signature.parameter_count(), 2);
    }

    #[test]
    fn test_declarations_registry() {
        let declarations = Declarations::new()
            .with_type(TypeDeclaration::new("Order").implements("Auditable"))
            .with_group(GroupDefinition::new("Billing"));

        assert_eq!(declarations.type_count(), 1);
        let order = declarations.type_declaration("Order").unwrap();
        assert_eq!(order.interfaces, vec!["Auditable".to_string()]);
        assert!(declarations.type_declaration("Missing").is_none());
        assert!(declarations.group_definition(&GroupId::new("Billing")).is_some());
    }
}
