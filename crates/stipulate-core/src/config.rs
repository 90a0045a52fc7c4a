//! Engine configuration
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relaxations of the method configuration rules
///
/// Every flag defaults to `false`, which enforces the strict rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodValidationConfig {
    /// Allow an overriding method to add or alter parameter constraints
    pub allow_overriding_method_alter_parameter_constraint: bool,
    /// Allow the return value to be marked cascaded more than once per hierarchy line
    pub allow_multiple_cascaded_validation_on_return_values: bool,
    /// Allow parallel methods (same signature, unrelated types) to define parameter constraints
    pub allow_parallel_methods_define_parameter_constraints: bool,
}

/// Validator factory configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Stop at the first constraint violation
    pub fail_fast: bool,
    /// Method configuration rule relaxations
    pub method_validation: MethodValidationConfig,
}

impl ValidatorConfig {
    /// Create the default (strict, collect-all) configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Allow overriding methods to alter parameter constraints
    pub fn allow_overriding_method_alter_parameter_constraint(mut self) -> Self {
        self.method_validation
            .allow_overriding_method_alter_parameter_constraint = true;
        self
    }

    /// Allow multiple cascades of the same return value in one hierarchy line
    pub fn allow_multiple_cascaded_validation_on_return_values(mut self) -> Self {
        self.method_validation
            .allow_multiple_cascaded_validation_on_return_values = true;
        self
    }

    /// Allow parallel methods to define parameter constraints
    pub fn allow_parallel_methods_define_parameter_constraints(mut self) -> Self {
        self.method_validation
            .allow_parallel_methods_define_parameter_constraints = true;
        self
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(Error::configuration(format!(
                "Unsupported configuration file extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }
}
