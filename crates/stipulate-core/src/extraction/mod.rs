//! Value extraction from containers
//!
//! A value extractor pulls the elements at one type-argument position out of
//! a container value, together with the path node that addresses each
//! element. Extractors are looked up by container type and position in a
//! [`ValueExtractorRegistry`]; the most specific registered container type
//! wins.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

pub mod builtin;
pub mod registry;

pub use builtin::{IterableExtractor, ListExtractor, MapKeyExtractor, MapValueExtractor, OptionalExtractor};
pub use registry::ValueExtractorRegistry;

use crate::path::ElementNode;
use crate::value::Value;

/// One element pulled out of a container
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedValue {
    pub node: ElementNode,
    pub value: Value,
}

impl ExtractedValue {
    pub fn new(node: ElementNode, value: Value) -> Self {
        Self { node, value }
    }
}

/// Extracts the elements at one type-argument position of a container type
pub trait ValueExtractor: Send + Sync {
    /// Container type this extractor is registered for
    fn container_type(&self) -> &str;

    /// Type-argument position it extracts
    fn type_argument(&self) -> usize;

    /// Elements of `container`; values of an unexpected shape yield nothing
    fn extract(&self, container: &Value) -> Vec<ExtractedValue>;
}
