//! Extractors for the built-in container values
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::{ExtractedValue, ValueExtractor};
use crate::path::ElementNode;
use crate::value::Value;

/// `List` elements, addressed by index
#[derive(Debug, Default, Clone, Copy)]
pub struct ListExtractor;

impl ValueExtractor for ListExtractor {
    fn container_type(&self) -> &str {
        "List"
    }

    fn type_argument(&self) -> usize {
        0
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| ExtractedValue::new(ElementNode::Index(i), item.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Elements of any iterable value, without a stable address
#[derive(Debug, Default, Clone, Copy)]
pub struct IterableExtractor;

impl ValueExtractor for IterableExtractor {
    fn container_type(&self) -> &str {
        "Iterable"
    }

    fn type_argument(&self) -> usize {
        0
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::List(items) | Value::Set(items) => items
                .iter()
                .map(|item| ExtractedValue::new(ElementNode::Iterable, item.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// `Map` keys (type argument 0)
#[derive(Debug, Default, Clone, Copy)]
pub struct MapKeyExtractor;

impl ValueExtractor for MapKeyExtractor {
    fn container_type(&self) -> &str {
        "Map"
    }

    fn type_argument(&self) -> usize {
        0
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Map(entries) => entries
                .iter()
                .map(|(key, _)| ExtractedValue::new(ElementNode::Key(key.clone()), key.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// `Map` values (type argument 1), addressed by key
#[derive(Debug, Default, Clone, Copy)]
pub struct MapValueExtractor;

impl ValueExtractor for MapValueExtractor {
    fn container_type(&self) -> &str {
        "Map"
    }

    fn type_argument(&self) -> usize {
        1
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Map(entries) => entries
                .iter()
                .map(|(key, value)| ExtractedValue::new(ElementNode::Key(key.clone()), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The wrapped value of an `Optional`; adds no path node
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionalExtractor;

impl ValueExtractor for OptionalExtractor {
    fn container_type(&self) -> &str {
        "Optional"
    }

    fn type_argument(&self) -> usize {
        0
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Optional(Some(inner)) => vec![ExtractedValue::new(ElementNode::Single, (**inner).clone())],
            Value::Optional(None) => vec![ExtractedValue::new(ElementNode::Single, Value::Null)],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_iterable_nodes() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let extracted = ListExtractor.extract(&list);
        assert_eq!(extracted[1].node, ElementNode::Index(1));

        let set = Value::Set(vec![Value::Int(1)]);
        assert_eq!(IterableExtractor.extract(&set)[0].node, ElementNode::Iterable);
        assert!(ListExtractor.extract(&set).is_empty());
    }

    #[test]
    fn test_map_keys_and_values() {
        let map = Value::Map(vec![(Value::text("a"), Value::Int(1))]);
        let keys = MapKeyExtractor.extract(&map);
        let values = MapValueExtractor.extract(&map);

        assert_eq!(keys[0].value, Value::text("a"));
        assert_eq!(values[0].value, Value::Int(1));
        assert_eq!(values[0].node, ElementNode::Key(Value::text("a")));
    }

    #[test]
    fn test_optional_unwraps() {
        let present = Value::Optional(Some(Box::new(Value::text("x"))));
        assert_eq!(OptionalExtractor.extract(&present)[0].value, Value::text("x"));

        let empty = Value::Optional(None);
        assert!(OptionalExtractor.extract(&empty)[0].value.is_null());
    }
}
