//! Evaluation of (possibly composed) constraints against one value
//!
//! Every part of a composed constraint is evaluated, there is no
//! short-circuit between parts. The constraint's own validator, if any, is one
//! more part of the boolean combination.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::validator::{ConstraintValidatorContext, CustomViolation};
use crate::error::{Error, Result};
use crate::metadata::{CompositionType, ConstraintDescriptor};
use crate::value::Value;
use std::sync::Arc;

/// A violation produced by one descriptor of a composition tree
#[derive(Debug, Clone)]
pub(crate) struct PendingViolation {
    pub descriptor: Arc<ConstraintDescriptor>,
    pub violation: CustomViolation,
}

/// Outcome of evaluating one descriptor
#[derive(Debug, Default)]
pub(crate) struct Evaluation {
    pub failed: bool,
    pub violations: Vec<PendingViolation>,
}

impl Evaluation {
    fn passed() -> Self {
        Self::default()
    }
}

pub(crate) fn evaluate(descriptor: &Arc<ConstraintDescriptor>, value: &Value) -> Result<Evaluation> {
    let mut parts = Vec::with_capacity(descriptor.composing().len());
    for part in descriptor.composing() {
        parts.push(evaluate(part, value)?);
    }
    let local = evaluate_local(descriptor, value)?;

    let outcomes = || parts.iter().chain(local.iter());
    let failed = if parts.is_empty() {
        local.as_ref().is_some_and(|o| o.failed)
    } else {
        match descriptor.composition() {
            CompositionType::And => outcomes().any(|o| o.failed),
            CompositionType::Or => outcomes().all(|o| o.failed),
            CompositionType::AllFalse => outcomes().any(|o| !o.failed),
        }
    };
    if !failed {
        return Ok(Evaluation::passed());
    }

    // the local validator's violations survive; only composing parts collapse
    let local = local.filter(|o| o.failed);
    let single = descriptor.is_report_as_single_violation() || descriptor.composition() == CompositionType::AllFalse;
    let mut violations = Vec::new();
    if single {
        if local.is_none() {
            violations.push(PendingViolation {
                descriptor: descriptor.clone(),
                violation: CustomViolation {
                    template: descriptor.message_template().to_string(),
                    nodes: Vec::new(),
                },
            });
        }
    } else {
        violations.extend(parts.into_iter().flat_map(|o| o.violations));
    }
    if let Some(local) = local {
        violations.extend(local.violations);
    }

    Ok(Evaluation {
        failed: true,
        violations,
    })
}

/// Run the descriptor's own validator; `None` for purely composed constraints
fn evaluate_local(descriptor: &Arc<ConstraintDescriptor>, value: &Value) -> Result<Option<Evaluation>> {
    if descriptor.validators().is_empty() {
        return Ok(None);
    }
    let validator = descriptor
        .validators()
        .iter()
        .find(|v| v.accepts(value))
        .ok_or_else(|| Error::UnexpectedValueType {
            constraint: descriptor.name().to_string(),
            value_type: value.type_name().to_string(),
        })?;

    let mut context = ConstraintValidatorContext::new(descriptor.message_template());
    let valid = validator
        .is_valid(value, &mut context)
        .map_err(|source| Error::Validator {
            constraint: descriptor.name().to_string(),
            source,
        })?;
    if valid {
        return Ok(Some(Evaluation::passed()));
    }

    let violations = context
        .into_violations()
        .into_iter()
        .map(|violation| PendingViolation {
            descriptor: descriptor.clone(),
            violation,
        })
        .collect();
    Ok(Some(Evaluation {
        failed: true,
        violations,
    }))
}
