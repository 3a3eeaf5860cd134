//! A single versioned tree node: a typed tombstone, LWW keyed properties, and an
//! ordered, tombstoned child list.

use std::collections::HashMap;

use crate::id::Id;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An LWW register: a value paired with the stamp of the write that installed it.
/// A default `Prop` (stamp absent) is never-set.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prop {
    pub value: String,
    pub stamp: Id,
}

impl Prop {
    fn is_set(&self) -> bool {
        !self.stamp.is_absent()
    }
}

/// One entry in a node's child list. Retained as a tombstone after removal so a
/// later merge can recognize "deleted" instead of "never seen".
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChildRef {
    pub child_id: Id,
    pub added_stamp: Id,
    pub deleted: bool,
    pub deleted_stamp: Id,
}

impl ChildRef {
    fn new(child_id: Id, stamp: Id) -> Self {
        Self {
            child_id,
            added_stamp: stamp,
            deleted: false,
            deleted_stamp: Id::absent(),
        }
    }
}

/// A node in the replicated tree: identity and type are immutable, everything else
/// is a CRDT register merged against a remote copy of the same node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    pub id: Id,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: String,
    pub deleted: bool,
    pub deleted_stamp: Id,
    pub properties: HashMap<String, Prop>,
    pub children: Vec<ChildRef>,
}

impl Node {
    pub fn new(id: Id, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            deleted: false,
            deleted_stamp: Id::absent(),
            properties: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Deletion is monotone: a later, larger stamp always wins, and no stamp can
    /// undelete a node once it has been observed deleted.
    pub fn mark_deleted(&mut self, stamp: Id) {
        if !self.deleted || stamp > self.deleted_stamp {
            self.deleted = true;
            self.deleted_stamp = stamp;
        }
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<String>, stamp: Id) {
        match self.properties.get_mut(key) {
            Some(existing) if stamp > existing.stamp => {
                existing.value = value.into();
                existing.stamp = stamp;
            }
            Some(_) => {}
            None => {
                self.properties.insert(
                    key.to_string(),
                    Prop {
                        value: value.into(),
                        stamp,
                    },
                );
            }
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .filter(|prop| prop.is_set())
            .map(|prop| prop.value.as_str())
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.get(key).is_some_and(Prop::is_set)
    }

    /// Appends a new child, or resurrects a tombstoned one iff `stamp` strictly
    /// dominates the stamp that deleted it. A later stamp wins whether it is an
    /// add or a remove — this is a deliberate generalization of add-wins.
    pub fn add_child(&mut self, child_id: Id, stamp: Id) {
        if let Some(entry) = self.children.iter_mut().find(|c| c.child_id == child_id) {
            if entry.deleted && stamp > entry.deleted_stamp {
                entry.deleted = false;
                entry.added_stamp = stamp;
                entry.deleted_stamp = Id::absent();
            }
            return;
        }
        self.children.push(ChildRef::new(child_id, stamp));
    }

    /// No matching entry is a no-op: a remote merge may later install the
    /// tombstone. Remove-wins over an add with an equal-or-smaller stamp only.
    pub fn remove_child(&mut self, child_id: Id, stamp: Id) {
        if let Some(entry) = self.children.iter_mut().find(|c| c.child_id == child_id) {
            if !entry.deleted || stamp > entry.deleted_stamp {
                entry.deleted = true;
                entry.deleted_stamp = stamp;
            }
        }
    }

    pub fn visible_children(&self) -> Vec<Id> {
        self.children
            .iter()
            .filter(|c| !c.deleted)
            .map(|c| c.child_id.clone())
            .collect()
    }

    /// Merges `other` into `self` in place. Returns `false` without changing
    /// anything when `other` disagrees on identity or type — the caller is
    /// expected to log that condition, never raise it.
    pub fn merge(&mut self, other: &Node) -> bool {
        if other.id != self.id || other.kind != self.kind {
            return false;
        }

        if other.deleted {
            self.mark_deleted(other.deleted_stamp.clone());
        }

        for (key, prop) in &other.properties {
            match self.properties.get_mut(key) {
                Some(existing) if prop.stamp > existing.stamp => {
                    *existing = prop.clone();
                }
                Some(_) => {}
                None => {
                    self.properties.insert(key.clone(), prop.clone());
                }
            }
        }

        for other_child in &other.children {
            match self
                .children
                .iter_mut()
                .find(|c| c.child_id == other_child.child_id)
            {
                Some(local) => {
                    if other_child.deleted {
                        if !local.deleted || other_child.deleted_stamp > local.deleted_stamp {
                            local.deleted = true;
                            local.deleted_stamp = other_child.deleted_stamp.clone();
                        }
                    } else if local.deleted && other_child.added_stamp > local.deleted_stamp {
                        local.deleted = false;
                        local.added_stamp = other_child.added_stamp.clone();
                        local.deleted_stamp = Id::absent();
                    }
                }
                None => self.children.push(other_child.clone()),
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(site: &str, clock: u64) -> Id {
        Id::new(site, clock)
    }

    #[test]
    fn property_lww_keeps_greater_stamp_regardless_of_arrival_order() {
        let mut n = Node::new(stamp("A", 1), "rectangle");
        n.set_property("x", "10", stamp("A", 2));
        n.set_property("x", "20", stamp("B", 2));
        assert_eq!(n.get_property("x"), Some("20"));

        let mut m = Node::new(stamp("A", 1), "rectangle");
        m.set_property("x", "20", stamp("B", 2));
        m.set_property("x", "10", stamp("A", 2));
        assert_eq!(m.get_property("x"), Some("20"));
    }

    #[test]
    fn absent_property_reads_as_none() {
        let n = Node::new(stamp("A", 1), "rectangle");
        assert_eq!(n.get_property("x"), None);
        assert!(!n.has_property("x"));
    }

    #[test]
    fn deletion_is_monotone() {
        let mut n = Node::new(stamp("A", 1), "frame");
        n.mark_deleted(stamp("A", 5));
        n.mark_deleted(stamp("A", 3));
        assert!(n.deleted);
        assert_eq!(n.deleted_stamp, stamp("A", 5));
    }

    #[test]
    fn remove_then_readd_resurrects_child() {
        let mut n = Node::new(stamp("A", 1), "frame");
        let child = stamp("A", 2);
        n.add_child(child.clone(), stamp("A", 3));
        n.remove_child(child.clone(), stamp("A", 4));
        assert!(n.visible_children().is_empty());
        n.add_child(child.clone(), stamp("A", 5));
        assert_eq!(n.visible_children(), vec![child]);
    }

    #[test]
    fn concurrent_add_and_remove_remove_wins_on_later_stamp() {
        let mut local = Node::new(stamp("A", 1), "frame");
        let s = stamp("A", 10);
        local.add_child(s.clone(), stamp("A", 3));

        let mut remote = Node::new(stamp("A", 1), "frame");
        remote.add_child(s.clone(), stamp("A", 3));
        remote.remove_child(s.clone(), stamp("B", 4));

        local.merge(&remote);
        assert!(local.visible_children().is_empty());
    }

    #[test]
    fn merge_refuses_type_mismatch() {
        let mut local = Node::new(stamp("A", 1), "frame");
        let other = Node::new(stamp("A", 1), "rectangle");
        assert!(!local.merge(&other));
        assert_eq!(local.kind, "frame");
    }

    #[test]
    fn merge_appends_unseen_children_and_preserves_local_positions() {
        let mut local = Node::new(stamp("A", 1), "frame");
        local.add_child(stamp("A", 2), stamp("A", 2));
        local.add_child(stamp("A", 3), stamp("A", 3));

        let mut remote = Node::new(stamp("A", 1), "frame");
        remote.add_child(stamp("A", 2), stamp("A", 2));
        remote.add_child(stamp("B", 9), stamp("B", 9));

        local.merge(&remote);
        assert_eq!(
            local.visible_children(),
            vec![stamp("A", 2), stamp("A", 3), stamp("B", 9)]
        );
    }
}
