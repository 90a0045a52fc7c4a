//! Built-in constraint validators
//!
//! Every validator except the null checks treats `Null` as valid; nullness
//! is the business of `NotNull`.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::validator::{ConstraintValidator, ConstraintValidatorContext};
use crate::metadata::Attributes;
use crate::value::Value;
use anyhow::{anyhow, bail, Context};
use regex::Regex;

fn integer_attribute(attributes: &Attributes, name: &str) -> anyhow::Result<Option<i64>> {
    match attributes.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| anyhow!("attribute '{}' must be an integer, got {}", name, value)),
    }
}

fn is_sized(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Text(_) | Value::List(_) | Value::Set(_) | Value::Map(_)
    )
}

#[derive(Debug, Default)]
pub struct NotNullValidator;

impl ConstraintValidator for NotNullValidator {
    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(!value.is_null())
    }
}

#[derive(Debug, Default)]
pub struct NullValidator;

impl ConstraintValidator for NullValidator {
    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(value.is_null())
    }
}

#[derive(Debug, Default)]
pub struct NotEmptyValidator;

impl ConstraintValidator for NotEmptyValidator {
    fn accepts(&self, value: &Value) -> bool {
        is_sized(value)
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(!value.is_null() && !value.is_empty())
    }
}

#[derive(Debug, Default)]
pub struct NotBlankValidator;

impl ConstraintValidator for NotBlankValidator {
    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::Text(_))
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(value.as_str().is_some_and(|text| !text.trim().is_empty()))
    }
}

/// Length of text or element count of a collection within `[min, max]`
#[derive(Debug)]
pub struct SizeValidator {
    min: i64,
    max: i64,
}

impl Default for SizeValidator {
    fn default() -> Self {
        Self { min: 0, max: i64::MAX }
    }
}

impl ConstraintValidator for SizeValidator {
    fn initialize(&mut self, attributes: &Attributes) -> anyhow::Result<()> {
        self.min = integer_attribute(attributes, "min")?.unwrap_or(0);
        self.max = integer_attribute(attributes, "max")?.unwrap_or(i64::MAX);
        if self.min < 0 {
            bail!("the min parameter cannot be negative");
        }
        if self.max < self.min {
            bail!("the length cannot be negative (min {} > max {})", self.min, self.max);
        }
        Ok(())
    }

    fn accepts(&self, value: &Value) -> bool {
        is_sized(value)
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(match value.len() {
            Some(len) => {
                let len = len as i64;
                len >= self.min && len <= self.max
            }
            None => true,
        })
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Int(_) | Value::Float(_))
}

#[derive(Debug, Default)]
pub struct MinValidator {
    min: i64,
}

impl ConstraintValidator for MinValidator {
    fn initialize(&mut self, attributes: &Attributes) -> anyhow::Result<()> {
        self.min = integer_attribute(attributes, "value")?.context("Min requires a 'value' attribute")?;
        Ok(())
    }

    fn accepts(&self, value: &Value) -> bool {
        is_numeric(value)
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(match value {
            Value::Int(i) => *i >= self.min,
            Value::Float(x) => !x.is_nan() && *x >= self.min as f64,
            _ => true,
        })
    }
}

#[derive(Debug, Default)]
pub struct MaxValidator {
    max: i64,
}

impl ConstraintValidator for MaxValidator {
    fn initialize(&mut self, attributes: &Attributes) -> anyhow::Result<()> {
        self.max = integer_attribute(attributes, "value")?.context("Max requires a 'value' attribute")?;
        Ok(())
    }

    fn accepts(&self, value: &Value) -> bool {
        is_numeric(value)
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(match value {
            Value::Int(i) => *i <= self.max,
            Value::Float(x) => !x.is_nan() && *x <= self.max as f64,
            _ => true,
        })
    }
}

/// Whole-text regular expression match
#[derive(Debug, Default)]
pub struct PatternValidator {
    regex: Option<Regex>,
}

impl ConstraintValidator for PatternValidator {
    fn initialize(&mut self, attributes: &Attributes) -> anyhow::Result<()> {
        let pattern = attributes
            .get("regexp")
            .and_then(|v| v.as_str())
            .context("Pattern requires a string 'regexp' attribute")?;
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .with_context(|| format!("invalid regular expression '{}'", pattern))?;
        self.regex = Some(regex);
        Ok(())
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::Text(_))
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        let regex = self.regex.as_ref().context("pattern validator used before initialization")?;
        Ok(value.as_str().map_or(true, |text| regex.is_match(text)))
    }
}

#[derive(Debug, Default)]
pub struct AssertTrueValidator;

impl ConstraintValidator for AssertTrueValidator {
    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::Bool(_))
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(value.as_bool().unwrap_or(true))
    }
}

#[derive(Debug, Default)]
pub struct AssertFalseValidator;

impl ConstraintValidator for AssertFalseValidator {
    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::Bool(_))
    }

    fn is_valid(&self, value: &Value, _context: &mut ConstraintValidatorContext) -> anyhow::Result<bool> {
        Ok(!value.as_bool().unwrap_or(false))
    }
}
