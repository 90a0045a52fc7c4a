//! Validation groups, group sequences and group order resolution
//!
//! A group is a named validation context. Groups may extend other groups and
//! may be declared as sequences of groups, evaluated in order with a
//! short-circuit after the first group producing violations.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

pub mod order;
pub mod resolver;

pub use order::{GroupSlot, ValidationOrder};
pub use resolver::{DefaultGroupSequenceProvider, GroupResolver};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Name of the group constraints belong to when they declare none
pub const DEFAULT_GROUP: &str = "Default";

/// Identifier of a validation group
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(Arc<str>);

impl GroupId {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The Default group
    pub fn default_group() -> Self {
        Self::new(DEFAULT_GROUP)
    }

    /// The implicit group named after a bean type
    pub fn of_type(type_name: &str) -> Self {
        Self::new(type_name)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        &*self.0 == DEFAULT_GROUP
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::default_group()
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(GroupId::new)
    }
}

impl From<&str> for GroupId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Declaration of a group: its parents and, for sequences, its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub id: GroupId,
    /// Groups this group extends
    #[serde(default)]
    pub extends: Vec<GroupId>,
    /// Members when this group is a group sequence
    #[serde(default)]
    pub sequence: Option<Vec<GroupId>>,
}

impl GroupDefinition {
    /// A plain group
    pub fn new<G: Into<GroupId>>(id: G) -> Self {
        Self {
            id: id.into(),
            extends: Vec::new(),
            sequence: None,
        }
    }

    /// A group sequence
    pub fn sequence<G, I>(id: G, members: I) -> Self
    where
        G: Into<GroupId>,
        I: IntoIterator,
        I::Item: Into<GroupId>,
    {
        Self {
            id: id.into(),
            extends: Vec::new(),
            sequence: Some(members.into_iter().map(Into::into).collect()),
        }
    }

    /// Add a parent group
    pub fn extending<G: Into<GroupId>>(mut self, parent: G) -> Self {
        self.extends.push(parent.into());
        self
    }

    pub fn is_sequence(&self) -> bool {
        self.sequence.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group() {
        assert!(GroupId::default().is_default());
        assert!(!GroupId::new("Billing").is_default());
        assert_eq!(GroupId::of_type("Order").name(), "Order");
    }

    #[test]
    fn test_group_definition_builders() {
        let def = GroupDefinition::new("Extended").extending("Basic");
        assert_eq!(def.extends, vec![GroupId::new("Basic")]);
        assert!(!def.is_sequence());

        let seq = GroupDefinition::sequence("Checks", ["Basic", "Extended"]);
        assert!(seq.is_sequence());
        assert_eq!(seq.sequence.unwrap().len(), 2);
    }

    #[test]
    fn test_group_id_serde_transparent() {
        let json = serde_json::to_string(&GroupId::new("Basic")).unwrap();
        assert_eq!(json, "\"Basic\"");
        let back: GroupId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GroupId::new("Basic"));
    }
}
