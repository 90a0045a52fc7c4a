//! Validation engine: factory, validators, traversal and violations
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

mod context;
pub mod factory;
pub mod traversable;
mod traversal;
pub mod validator;
pub mod violation;

pub use factory::{ValidatorFactory, ValidatorFactoryBuilder};
pub use traversable::{DefaultTraversableResolver, TraversableResolver};
pub use validator::Validator;
pub use violation::{ConstraintViolation, ConstraintViolations};
