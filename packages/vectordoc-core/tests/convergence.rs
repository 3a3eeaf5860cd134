//! Merge-order independence: commutativity, associativity, and idempotence of
//! [`Document::merge`], exercised across arbitrary merge orders the way the
//! op-log sibling of this crate exercises arbitrary operation orders.

use std::collections::{BTreeMap, BTreeSet};

use vectordoc_core::Document;

/// A canonical view of a document that ignores child-list insertion order
/// (which the merge contract explicitly leaves unconverged) but captures
/// every other observable: per-node type, tombstone, resolved properties,
/// and the *set* of visible children.
fn observable_snapshot(
    doc: &Document,
) -> BTreeMap<String, (String, bool, BTreeMap<String, String>, BTreeSet<String>)> {
    doc.all_node_ids()
        .into_iter()
        .map(|id| {
            let node = doc.get_node(&id).unwrap();
            let properties: BTreeMap<String, String> = node
                .properties
                .iter()
                .filter(|(_, prop)| !prop.stamp.is_absent())
                .map(|(key, prop)| (key.clone(), prop.value.clone()))
                .collect();
            let children: BTreeSet<String> =
                node.visible_children().into_iter().map(|c| c.to_string()).collect();
            (id.to_string(), (node.kind.clone(), node.deleted, properties, children))
        })
        .collect()
}

fn replica_a() -> Document {
    let mut doc = Document::new("A");
    let frame = doc.create_node("frame");
    doc.set_property(&frame, "x", "10");
    let rect = doc.create_node("rectangle");
    doc.add_child(&frame, &rect);
    doc.set_property(&rect, "fill", "#FF0000");
    doc
}

fn replica_b() -> Document {
    let mut doc = Document::new("B");
    let text = doc.create_node("text");
    doc.set_property(&text, "text", "hello");
    let rect = doc.create_node("rectangle");
    doc.delete_node(&rect);
    doc
}

fn replica_c() -> Document {
    let mut doc = Document::new("C");
    let frame = doc.create_node("frame");
    doc.set_property(&frame, "x", "999");
    doc.set_property(&frame, "y", "1");
    doc
}

#[test]
fn merge_is_commutative() {
    let a = replica_a();
    let b = replica_b();

    let mut ab = Document::new("A");
    ab.merge(&a);
    ab.merge(&b);

    let mut ba = Document::new("A");
    ba.merge(&b);
    ba.merge(&a);

    assert_eq!(observable_snapshot(&ab), observable_snapshot(&ba));
}

#[test]
fn merge_is_associative() {
    let a = replica_a();
    let b = replica_b();
    let c = replica_c();

    let mut left = Document::new("A");
    left.merge(&a);
    left.merge(&b);
    let mut left_then_c = Document::new("A");
    left_then_c.merge(&left);
    left_then_c.merge(&c);

    let mut right = Document::new("A");
    right.merge(&b);
    right.merge(&c);
    let mut a_then_right = Document::new("A");
    a_then_right.merge(&a);
    a_then_right.merge(&right);

    assert_eq!(observable_snapshot(&left_then_c), observable_snapshot(&a_then_right));
}

#[test]
fn merge_is_idempotent() {
    let a = replica_a();
    let mut once = Document::new("A");
    once.merge(&a);
    let before = observable_snapshot(&once);

    once.merge(&a.clone());
    assert_eq!(observable_snapshot(&once), before);

    once.merge(&once.clone());
    assert_eq!(observable_snapshot(&once), before);
}

#[test]
fn merge_order_converges_across_every_permutation() {
    let docs = [replica_a(), replica_b(), replica_c()];

    fn heap_permute(k: usize, items: &mut [usize], res: &mut Vec<Vec<usize>>) {
        if k == 1 {
            res.push(items.to_vec());
            return;
        }
        heap_permute(k - 1, items, res);
        for i in 0..(k - 1) {
            if k.is_multiple_of(2) {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
            heap_permute(k - 1, items, res);
        }
    }
    let mut indices = vec![0, 1, 2];
    let mut permutations = Vec::new();
    heap_permute(indices.len(), &mut indices.clone(), &mut permutations);
    indices.clear();

    let mut baseline = None;
    for perm in permutations {
        let mut acc = Document::new("observer");
        for i in perm {
            acc.merge(&docs[i]);
        }
        let snapshot = observable_snapshot(&acc);
        match &baseline {
            None => baseline = Some(snapshot),
            Some(base) => assert_eq!(&snapshot, base),
        }
    }
}

#[test]
fn monotone_deletion_survives_a_concurrent_property_write() {
    let mut a = Document::new("A");
    let frame = a.create_node("frame");
    a.delete_node(&frame); // stamp (A,3)

    let mut b = Document::new("B");
    b.merge(&a);
    b.set_property(&frame, "x", "should not resurrect"); // local write, no deletion-flag stamp

    a.merge(&b);
    assert!(a.get_node(&frame).unwrap().deleted);
}
