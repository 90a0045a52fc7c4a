//! Constraint validators, composition and message interpolation
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

pub mod builtin;
pub(crate) mod composition;
pub mod factory;
pub mod interpolation;
pub mod validator;

pub use factory::{ConstraintValidatorFactory, DefaultConstraintValidatorFactory};
pub use interpolation::{DefaultMessageInterpolator, InterpolationContext, MessageInterpolator};
pub use validator::{ConstraintValidator, ConstraintValidatorContext, CustomViolation, FnValidator, ViolationBuilder};
