//! Stipulate Core - Constraint validation engine for object graphs
//!
//! Constraints are declared per type (on the type itself, its properties,
//! container elements and executables) and aggregated over the type
//! hierarchy. Validation walks an object graph, evaluating the constraints of
//! the requested groups and cascading into referenced beans and container
//! elements.
//!
//! # Main Components
//!
//! - **Metadata**: declarations, hierarchy-aware bean and executable metadata, cached per factory
//! - **Groups**: group inheritance, group sequences and redefined default sequences
//! - **Constraints**: validators, composed constraints and message interpolation
//! - **Value extraction**: pluggable extractors for container elements
//! - **Engine**: bean, property, value and executable validation
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stipulate_core::{
//!     ConstraintDeclaration, Declarations, DynamicBean, PropertyDeclaration, TypeDeclaration, Validator,
//!     ValidatorFactory,
//! };
//!
//! fn example() -> stipulate_core::Result<()> {
//!     let declarations = Declarations::new().with_type(
//!         TypeDeclaration::new("User")
//!             .property(PropertyDeclaration::new("name").constraint(ConstraintDeclaration::not_null())),
//!     );
//!     let factory = ValidatorFactory::new(Arc::new(declarations));
//!     let validator: Validator = factory.validator();
//!
//!     let user = DynamicBean::new("User").into_arc();
//!     let violations = validator.validate(&user, &[])?;
//!     assert_eq!(violations.len(), 1);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod group;
pub mod metadata;
pub mod path;
pub mod value;

// Re-export main types for convenience
pub use config::{MethodValidationConfig, ValidatorConfig};
pub use constraint::{
    ConstraintValidator, ConstraintValidatorContext, ConstraintValidatorFactory, DefaultConstraintValidatorFactory,
    DefaultMessageInterpolator, FnValidator, InterpolationContext, MessageInterpolator,
};
pub use engine::{
    ConstraintViolation, ConstraintViolations, DefaultTraversableResolver, TraversableResolver, Validator,
    ValidatorFactory, ValidatorFactoryBuilder,
};
pub use error::{Error, Result};
pub use extraction::{ExtractedValue, ValueExtractor, ValueExtractorRegistry};
pub use group::{DefaultGroupSequenceProvider, GroupDefinition, GroupId, DEFAULT_GROUP};
pub use metadata::{
    BeanMetaData, CompositionType, ConstraintDeclaration, ConstraintDescriptor, ContainerElementDeclaration,
    DeclarationReader, Declarations, ExecutableDeclaration, ExecutableKind, ExecutableMetaData, ExecutableSignature,
    ParameterDeclaration, PropertyDeclaration, TypeDeclaration,
};
pub use path::{ElementNode, PathNode, PropertyPath};
pub use value::{Accessor, Bean, Container, DynamicBean, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
