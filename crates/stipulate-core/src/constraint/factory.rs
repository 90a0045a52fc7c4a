//! Validator instantiation
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::builtin::*;
use super::validator::{ConstraintValidator, FnValidator};
use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Creates validator instances by implementation id
pub trait ConstraintValidatorFactory: Send + Sync {
    fn create(&self, validator_id: &str) -> Result<Box<dyn ConstraintValidator>>;
}

type Constructor = Arc<dyn Fn() -> Box<dyn ConstraintValidator> + Send + Sync>;

/// Registry of validator constructors, pre-populated with the built-ins
#[derive(Clone)]
pub struct DefaultConstraintValidatorFactory {
    constructors: HashMap<String, Constructor>,
}

impl DefaultConstraintValidatorFactory {
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register("NotNull", || Box::new(NotNullValidator));
        factory.register("Null", || Box::new(NullValidator));
        factory.register("NotEmpty", || Box::new(NotEmptyValidator));
        factory.register("NotBlank", || Box::new(NotBlankValidator));
        factory.register("Size", || Box::new(SizeValidator::default()));
        factory.register("Min", || Box::new(MinValidator::default()));
        factory.register("Max", || Box::new(MaxValidator::default()));
        factory.register("Pattern", || Box::new(PatternValidator::default()));
        factory.register("AssertTrue", || Box::new(AssertTrueValidator));
        factory.register("AssertFalse", || Box::new(AssertFalseValidator));
        factory
    }

    /// A factory without any registered validator
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `id`
    pub fn register<S, F>(&mut self, id: S, constructor: F)
    where
        S: Into<String>,
        F: Fn() -> Box<dyn ConstraintValidator> + Send + Sync + 'static,
    {
        self.constructors.insert(id.into(), Arc::new(constructor));
    }

    /// Register a stateless predicate as validator `id`
    pub fn register_fn<S, F>(&mut self, id: S, predicate: F)
    where
        S: Into<String>,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.register(id, move || {
            let predicate = predicate.clone();
            Box::new(FnValidator::new(move |value: &Value| (*predicate)(value)))
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }
}

impl Default for DefaultConstraintValidatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultConstraintValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.constructors.keys().collect();
        ids.sort();
        f.debug_struct("DefaultConstraintValidatorFactory")
            .field("validators", &ids)
            .finish()
    }
}

impl ConstraintValidatorFactory for DefaultConstraintValidatorFactory {
    fn create(&self, validator_id: &str) -> Result<Box<dyn ConstraintValidator>> {
        self.constructors
            .get(validator_id)
            .map(|constructor| constructor())
            .ok_or_else(|| Error::configuration(format!("no constraint validator registered under '{}'", validator_id)))
    }
}
