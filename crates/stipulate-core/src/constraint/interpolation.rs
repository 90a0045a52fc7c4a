//! Message template interpolation
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::metadata::Attributes;
use crate::value::Value;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Inputs available to a message template
#[derive(Debug, Clone, Copy)]
pub struct InterpolationContext<'a> {
    pub constraint: &'a str,
    pub attributes: &'a Attributes,
    pub validated_value: &'a Value,
}

/// Turns a message template into the final violation message
pub trait MessageInterpolator: Send + Sync {
    fn interpolate(&self, template: &str, context: &InterpolationContext<'_>) -> String;
}

/// Replaces `{name}` with the constraint attribute `name`
///
/// `{validatedValue}` renders the validated value. Unknown placeholders,
/// such as unresolved message keys, are kept verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessageInterpolator;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("placeholder pattern is valid")
    })
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

impl MessageInterpolator for DefaultMessageInterpolator {
    fn interpolate(&self, template: &str, context: &InterpolationContext<'_>) -> String {
        placeholder()
            .replace_all(template, |caps: &Captures<'_>| {
                let name = &caps[1];
                if name == "validatedValue" {
                    return context.validated_value.to_string();
                }
                match context.attributes.get(name) {
                    Some(value) => render(value),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interpolate(template: &str, attributes: serde_json::Value, value: Value) -> String {
        let attributes = attributes.as_object().cloned().unwrap_or_default();
        let context = InterpolationContext {
            constraint: "Size",
            attributes: &attributes,
            validated_value: &value,
        };
        DefaultMessageInterpolator.interpolate(template, &context)
    }

    #[test]
    fn test_attribute_substitution() {
        let message = interpolate(
            "size must be between {min} and {max}",
            json!({"min": 2, "max": 10}),
            Value::Null,
        );
        assert_eq!(message, "size must be between 2 and 10");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let message = interpolate("{Code.message}", json!({}), Value::Null);
        assert_eq!(message, "{Code.message}");
    }

    #[test]
    fn test_validated_value_and_strings() {
        let message = interpolate(
            "'{validatedValue}' must match \"{regexp}\"",
            json!({"regexp": "[a-z]+"}),
            Value::text("ABC"),
        );
        assert_eq!(message, "'ABC' must match \"[a-z]+\"");
    }
}
