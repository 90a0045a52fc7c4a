//! Property paths attached to constraint violations
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;

/// Position of an extracted container element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementNode {
    /// Indexed containers (lists)
    Index(usize),
    /// Maps, carrying the key
    Key(Value),
    /// Plain iterables (sets)
    Iterable,
    /// Single-valued wrappers add no path node
    Single,
}

impl ElementNode {
    /// Whether a parsed path selector designates this element
    pub fn matches(&self, selector: &PathSelector) -> bool {
        match (self, selector) {
            (ElementNode::Index(index), PathSelector::Index(wanted)) => index == wanted,
            (ElementNode::Key(key), PathSelector::Key(wanted)) => key.to_string() == *wanted,
            (ElementNode::Key(key), PathSelector::Index(wanted)) => *key == Value::Int(*wanted as i64),
            _ => false,
        }
    }
}

/// One node of a property path
#[derive(Debug, Clone, PartialEq)]
pub enum PathNode {
    Property(String),
    Element(ElementNode),
    Method(String),
    Constructor(String),
    Parameter { name: String, index: usize },
    CrossParameter,
    ReturnValue,
}

/// Ordered sequence of path nodes from the root bean to the violating value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPath {
    nodes: Vec<PathNode>,
}

impl PropertyPath {
    /// The empty path designating the root bean
    pub fn root() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn is_root(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child path with one more node
    pub fn child(&self, node: PathNode) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        Self { nodes }
    }

    pub fn property<S: Into<String>>(&self, name: S) -> Self {
        self.child(PathNode::Property(name.into()))
    }

    /// Child path for an extracted element; single-valued wrappers keep the path
    pub fn element(&self, node: &ElementNode) -> Self {
        match node {
            ElementNode::Single => self.clone(),
            other => self.child(PathNode::Element(other.clone())),
        }
    }

    /// Extend this path with nodes contributed by a custom violation
    pub fn extended(&self, extra: &[PathNode]) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.extend_from_slice(extra);
        Self { nodes }
    }

    /// Parse `a.b[1].c` style paths into segments
    pub fn parse(path: &str) -> Result<Vec<PathSegment>> {
        if path.trim().is_empty() {
            return Err(Error::invalid_path(path, "property path cannot be empty"));
        }

        let mut segments = Vec::new();
        for raw in path.split('.') {
            let (name, selector) = match raw.find('[') {
                Some(open) => {
                    if !raw.ends_with(']') {
                        return Err(Error::invalid_path(path, format!("unterminated selector in '{}'", raw)));
                    }
                    let inner = &raw[open + 1..raw.len() - 1];
                    let selector = match inner.parse::<usize>() {
                        Ok(index) => PathSelector::Index(index),
                        Err(_) => PathSelector::Key(inner.to_string()),
                    };
                    (&raw[..open], Some(selector))
                }
                None => (raw, None),
            };

            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(Error::invalid_path(path, format!("invalid property name '{}'", name)));
            }

            segments.push(PathSegment {
                name: name.to_string(),
                selector,
            });
        }

        Ok(segments)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            let separator = if i == 0 { "" } else { "." };
            match node {
                PathNode::Property(name) | PathNode::Method(name) | PathNode::Constructor(name) => {
                    write!(f, "{}{}", separator, name)?
                }
                PathNode::Parameter { name, .. } => write!(f, "{}{}", separator, name)?,
                PathNode::CrossParameter => write!(f, "{}<cross-parameter>", separator)?,
                PathNode::ReturnValue => write!(f, "{}<return value>", separator)?,
                PathNode::Element(ElementNode::Index(index)) => write!(f, "[{}]", index)?,
                PathNode::Element(ElementNode::Key(key)) => write!(f, "[{}]", key)?,
                PathNode::Element(ElementNode::Iterable) => write!(f, "[]")?,
                PathNode::Element(ElementNode::Single) => {}
            }
        }
        Ok(())
    }
}

/// Element selector of a parsed path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSelector {
    Index(usize),
    Key(String),
}

/// One `name[selector]` segment of a parsed property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub selector: Option<PathSelector>,
}
