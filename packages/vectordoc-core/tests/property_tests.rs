//! Property-based coverage of the LWW register and id round-trip guarantees
//! (§8 of the document model: property LWW and id round-trip).

use std::str::FromStr;

use proptest::prelude::*;
use vectordoc_core::{Document, Id};

fn arb_site() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,7}"
}

proptest! {
    #[test]
    fn id_round_trips_through_canonical_string(site in arb_site(), clock in 0u64..10_000) {
        let id = Id::new(site, clock);
        prop_assert_eq!(Id::from_str(&id.to_string()).unwrap(), id);
    }

    /// For any two stamps on the same property key, whichever arrives second in
    /// program order never regresses the value below whichever stamp sorts
    /// greater — arrival order must not matter, only the stamp.
    #[test]
    fn property_write_is_order_independent_lww(
        site_a in arb_site(),
        clock_a in 1u64..1_000,
        site_b in arb_site(),
        clock_b in 1u64..1_000,
    ) {
        prop_assume!(site_a != site_b || clock_a != clock_b);
        let stamp_a = Id::new(site_a, clock_a);
        let stamp_b = Id::new(site_b, clock_b);
        let winner = if stamp_a > stamp_b { "a" } else { "b" };

        let mut forward = Document::new("forward-harness");
        let frame = forward.create_node("frame");
        // Route both writes through the same node regardless of creation stamp
        // by writing the properties directly via the node API, bypassing the
        // document's own clock so we control the stamps precisely.
        {
            let node = forward.get_node_mut(&frame).unwrap();
            node.set_property("x", "from-a", stamp_a.clone());
            node.set_property("x", "from-b", stamp_b.clone());
        }
        let mut backward = Document::new("backward-harness");
        let frame2 = backward.create_node("frame");
        {
            let node = backward.get_node_mut(&frame2).unwrap();
            node.set_property("x", "from-b", stamp_b.clone());
            node.set_property("x", "from-a", stamp_a.clone());
        }

        let expected = if winner == "a" { "from-a" } else { "from-b" };
        prop_assert_eq!(forward.get_node(&frame).unwrap().get_property("x"), Some(expected));
        prop_assert_eq!(backward.get_node(&frame2).unwrap().get_property("x"), Some(expected));
    }

    /// Merging two documents that independently wrote the same property key
    /// with different stamps must converge both ways to the value owned by
    /// the greater stamp, regardless of merge direction.
    #[test]
    fn merge_resolves_concurrent_property_writes_by_stamp(
        x_a in -1000.0f64..1000.0,
        x_b in -1000.0f64..1000.0,
    ) {
        let mut a = Document::new("A");
        let frame = a.create_node("frame");
        a.set_property(&frame, "x", x_a.to_string());

        let mut b = Document::new("B");
        b.create_node_with_id(frame.clone(), "frame");
        b.set_property(&frame, "x", x_b.to_string());

        let node_a = a.get_node(&frame).unwrap();
        let node_b = b.get_node(&frame).unwrap();
        let expected_stamp = node_a.properties["x"].stamp.clone().max(node_b.properties["x"].stamp.clone());
        let expected_value = if expected_stamp == node_a.properties["x"].stamp { x_a } else { x_b };

        let mut merged_ab = a.clone();
        merged_ab.merge(&b);
        let mut merged_ba = b.clone();
        merged_ba.merge(&a);

        let got_ab: f64 = merged_ab.get_node(&frame).unwrap().get_property("x").unwrap().parse().unwrap();
        let got_ba: f64 = merged_ba.get_node(&frame).unwrap().get_property("x").unwrap().parse().unwrap();
        prop_assert_eq!(got_ab, expected_value);
        prop_assert_eq!(got_ba, expected_value);
    }
}
