//! Constraint metadata
//!
//! Raw declarations are read per type through a [`DeclarationReader`] and
//! aggregated over the whole type hierarchy into immutable [`BeanMetaData`]
//! and [`ExecutableMetaData`]. All consistency checks (group sequences, group
//! conversions, method configuration rules, value extractor resolution) run
//! while building, so a built model is known to be usable.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

pub mod bean;
pub mod cascading;
pub mod declaration;
pub mod descriptor;
pub mod element;
pub mod executable;
pub mod hierarchy;
pub mod location;
pub mod manager;
mod rules;

pub use bean::{BeanMetaData, DefaultGroupSequence, PropertyMetaData};
pub use cascading::CascadingMetadata;
pub use declaration::{
    Attributes, CascadingDeclaration, CompositionType, ConstraintDeclaration, ContainerElementDeclaration,
    DeclarationReader, Declarations, ElementDeclaration, ExecutableDeclaration, ExecutableKind,
    ExecutableSignature, ParameterDeclaration, PropertyDeclaration, TypeDeclaration,
};
pub use descriptor::{ConstraintDescriptor, MetaConstraint};
pub use element::{ContainerElementMetaData, ElementMetaData};
pub use executable::{ExecutableMetaData, ParameterMetaData};
pub use hierarchy::TypeHierarchy;
pub use location::{ConstraintLocation, LocationKind};
pub use manager::MetaDataManager;
