//! Map from identifier to node, clock advancement, document-level merge, and the
//! narrow mutation API the projection layer builds on.

use std::collections::HashMap;

use crate::id::Id;
use crate::node::Node;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const TYPE_ROOT: &str = "root";

/// A replica's view of the shared tree: every identifier ever observed has an
/// entry, deletion is a flag rather than a map removal.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Document {
    pub site: String,
    pub clock: u64,
    pub root_id: Id,
    pub nodes: HashMap<String, Node>,
}

impl Document {
    pub fn new(site: impl Into<String>) -> Self {
        let site = site.into();
        let mut doc = Self {
            site,
            clock: 0,
            root_id: Id::absent(),
            nodes: HashMap::new(),
        };
        let root_id = doc.next_stamp();
        doc.nodes
            .insert(root_id.to_string(), Node::new(root_id.clone(), TYPE_ROOT));
        doc.root_id = root_id;
        doc
    }

    fn next_stamp(&mut self) -> Id {
        self.clock += 1;
        Id::new(self.site.clone(), self.clock)
    }

    pub fn create_node(&mut self, kind: impl Into<String>) -> Id {
        let id = self.next_stamp();
        self.nodes.insert(id.to_string(), Node::new(id.clone(), kind));
        id
    }

    /// Installs a node at a caller-supplied id, used by deserialization and by
    /// tests that need two replicas to agree on an id up front. Advances the
    /// local clock if the id is locally-sited and ahead of it.
    pub fn create_node_with_id(&mut self, id: Id, kind: impl Into<String>) -> Id {
        if id.site == self.site && id.clock > self.clock {
            self.clock = id.clock;
        }
        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| Node::new(id.clone(), kind));
        id
    }

    pub fn get_node(&self, id: &Id) -> Option<&Node> {
        self.nodes.get(&id.to_string())
    }

    pub fn get_node_mut(&mut self, id: &Id) -> Option<&mut Node> {
        self.nodes.get_mut(&id.to_string())
    }

    /// Unknown ids are silently ignored; the editor is free to issue speculative
    /// operations without racing local state against a remote delete.
    pub fn delete_node(&mut self, id: &Id) {
        let stamp = self.next_stamp();
        if let Some(node) = self.nodes.get_mut(&id.to_string()) {
            node.mark_deleted(stamp);
        }
    }

    pub fn set_property(&mut self, id: &Id, key: &str, value: impl Into<String>) {
        let stamp = self.next_stamp();
        if let Some(node) = self.nodes.get_mut(&id.to_string()) {
            node.set_property(key, value, stamp);
        }
    }

    pub fn add_child(&mut self, parent: &Id, child: &Id) {
        let stamp = self.next_stamp();
        if let Some(node) = self.nodes.get_mut(&parent.to_string()) {
            node.add_child(child.clone(), stamp);
        }
    }

    pub fn remove_child(&mut self, parent: &Id, child: &Id) {
        let stamp = self.next_stamp();
        if let Some(node) = self.nodes.get_mut(&parent.to_string()) {
            node.remove_child(child.clone(), stamp);
        }
    }

    /// Visible children of `parent` in insertion order. An unknown parent yields
    /// an empty list rather than an error.
    pub fn children(&self, parent: &Id) -> Vec<Id> {
        self.get_node(parent)
            .map(Node::visible_children)
            .unwrap_or_default()
    }

    /// Every id that has ever been observed, including tombstoned nodes.
    pub fn all_node_ids(&self) -> Vec<Id> {
        self.nodes.values().map(|n| n.id.clone()).collect()
    }

    /// Idempotent, commutative, associative pointwise merge of two node maps.
    /// A node present in `other` but unknown locally is deep-cloned in; a node
    /// known to both is merged per [`Node::merge`]. Type mismatches are logged
    /// and the node is left untouched, never raised as an error.
    pub fn merge(&mut self, other: &Document) {
        for (key, other_node) in &other.nodes {
            match self.nodes.get_mut(key) {
                Some(local) => {
                    if !local.merge(other_node) {
                        Self::log_type_mismatch(key, &local.kind, &other_node.kind);
                    }
                }
                None => {
                    self.nodes.insert(key.clone(), other_node.clone());
                }
            }
        }
        self.advance_clock_from_observed_stamps();
    }

    #[cfg_attr(not(feature = "log"), allow(unused_variables))]
    fn log_type_mismatch(node: &str, local: &str, remote: &str) {
        let _err = crate::error::Error::TypeMismatch {
            node: node.to_string(),
            local: local.to_string(),
            remote: remote.to_string(),
        };
        #[cfg(feature = "log")]
        log::warn!("{_err}");
    }

    /// Restores invariant 1 (every locally-sited id is `<= clock`) after a merge
    /// may have introduced stamps this replica generated that were round-tripped
    /// back through a remote. Scans every stamp that can appear in a node, not
    /// just node identities.
    fn advance_clock_from_observed_stamps(&mut self) {
        let site = self.site.clone();
        let mut max_clock = self.clock;
        for node in self.nodes.values() {
            if node.id.site == site {
                max_clock = max_clock.max(node.id.clock);
            }
            if node.deleted_stamp.site == site {
                max_clock = max_clock.max(node.deleted_stamp.clock);
            }
            for prop in node.properties.values() {
                if prop.stamp.site == site {
                    max_clock = max_clock.max(prop.stamp.clock);
                }
            }
            for child in &node.children {
                if child.added_stamp.site == site {
                    max_clock = max_clock.max(child.added_stamp.clock);
                }
                if child.deleted_stamp.site == site {
                    max_clock = max_clock.max(child.deleted_stamp.clock);
                }
            }
        }
        self.clock = max_clock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_seeds_a_root_node() {
        let doc = Document::new("A");
        let root = doc.get_node(&doc.root_id).unwrap();
        assert_eq!(root.kind, TYPE_ROOT);
        assert!(!root.deleted);
    }

    #[test]
    fn create_node_with_id_advances_clock_for_local_site_only() {
        let mut doc = Document::new("A");
        assert_eq!(doc.clock, 1);
        doc.create_node_with_id(Id::new("A", 5), "frame");
        assert_eq!(doc.clock, 5);
        doc.create_node_with_id(Id::new("B", 99), "frame");
        assert_eq!(doc.clock, 5);
    }

    #[test]
    fn unknown_node_operations_are_silent_no_ops() {
        let mut doc = Document::new("A");
        let ghost = Id::new("A", 999);
        doc.set_property(&ghost, "x", "1");
        doc.delete_node(&ghost);
        doc.add_child(&ghost, &ghost);
        assert!(doc.get_node(&ghost).is_none());
    }

    #[test]
    fn merge_rehydrates_clock_past_any_locally_sited_stamp() {
        let mut a = Document::new("A");
        let frame = a.create_node("frame");
        a.set_property(&frame, "x", "1");
        let snapshot_clock = a.clock;

        let mut fresh = Document::new("A");
        fresh.merge(&a);
        assert!(fresh.clock >= snapshot_clock);
        let next = fresh.create_node("frame");
        assert!(next.clock > snapshot_clock);
    }

    #[test]
    fn merge_of_unrelated_replica_adopts_unseen_nodes() {
        let mut a = Document::new("A");
        let mut b = Document::new("B");
        let rect = b.create_node("rectangle");
        b.set_property(&rect, "x", "10");

        a.merge(&b);
        assert_eq!(a.get_node(&rect).unwrap().get_property("x"), Some("10"));
    }

    #[test]
    fn tombstones_survive_serialization_round_trip_via_merge() {
        let mut a = Document::new("A");
        let frame = a.create_node("frame");
        a.delete_node(&frame);

        let mut fresh = Document::new("A");
        fresh.merge(&a);
        assert!(fresh.get_node(&frame).unwrap().deleted);
        assert!(fresh.all_node_ids().contains(&frame));
    }
}
