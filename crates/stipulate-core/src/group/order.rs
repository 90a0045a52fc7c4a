//! Ordered group slots produced by the resolver
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use super::GroupId;

/// One unit of group evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSlot {
    /// A single group; its violations never stop other slots
    Group(GroupId),
    /// An expanded sequence; evaluation stops after the first member with violations
    Sequence { name: GroupId, groups: Vec<GroupId> },
}

impl GroupSlot {
    /// Groups evaluated by this slot, in order
    pub fn groups(&self) -> &[GroupId] {
        match self {
            GroupSlot::Group(group) => std::slice::from_ref(group),
            GroupSlot::Sequence { groups, .. } => groups,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, GroupSlot::Sequence { .. })
    }
}

/// Ordered list of slots to evaluate for one validation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOrder {
    slots: Vec<GroupSlot>,
}

impl ValidationOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single group unless an identical slot already exists
    pub fn insert_group(&mut self, group: GroupId) {
        let slot = GroupSlot::Group(group);
        if !self.slots.contains(&slot) {
            self.slots.push(slot);
        }
    }

    /// Append an expanded sequence unless one with the same name already exists
    pub fn insert_sequence(&mut self, name: GroupId, groups: Vec<GroupId>) {
        let exists = self.slots.iter().any(|slot| {
            matches!(slot, GroupSlot::Sequence { name: existing, .. } if *existing == name)
        });
        if !exists {
            self.slots.push(GroupSlot::Sequence { name, groups });
        }
    }

    pub fn slots(&self) -> &[GroupSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
