//! Property-based tests for the label tree.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated tags and operation sequences.

use proptest::prelude::*;

use labeltree::core::events::Notify;
use labeltree::core::node::{compare, compare_exact, TagChain};
use labeltree::core::snapshot::{parse_snapshot, serialize_snapshot};
use labeltree::core::tree::TagTree;
use labeltree::core::types::TagName;
use labeltree::core::verify::verify_tree;

/// Strategy for generating one valid segment.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}"
}

/// Strategy for generating valid dotted tags of depth 1 to 4.
fn valid_tag() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| segments.join("."))
}

/// Small alphabet so generated tags share prefixes often.
fn overlapping_tag() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..4)
        .prop_map(|segments| segments.join("."))
}

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Remove(String),
    RemoveAll(String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => overlapping_tag().prop_map(Op::Add),
        1 => overlapping_tag().prop_map(Op::Remove),
        1 => overlapping_tag().prop_map(Op::RemoveAll),
    ]
}

fn apply_ops(ops: &[Op]) -> TagTree {
    let mut tree = TagTree::new();
    for op in ops {
        match op {
            Op::Add(tag) => tree.add(tag).unwrap(),
            Op::Remove(tag) => tree.remove(tag).unwrap(),
            Op::RemoveAll(tag) => tree.remove_all(tag).unwrap(),
        };
    }
    tree
}

proptest! {
    #[test]
    fn add_then_remove_leaves_nothing(tag in valid_tag()) {
        let mut tree = TagTree::new();
        tree.add(&tag).unwrap();
        tree.remove(&tag).unwrap();

        prop_assert!(!tree.has(&tag));
        prop_assert!(tree.is_empty());
    }

    #[test]
    fn ancestor_counts_track_adds_minus_removes(
        tag in valid_tag(),
        (adds, removes) in (1usize..8).prop_flat_map(|n| (Just(n), 0..=n)),
    ) {
        let mut tree = TagTree::new();
        for _ in 0..adds {
            tree.add(&tag).unwrap();
        }
        for _ in 0..removes {
            tree.remove(&tag).unwrap();
        }

        let expected = (adds - removes) as i32;
        let name = TagName::new(&tag).unwrap();
        for prefix in name.ancestors().iter().chain(std::iter::once(&name)) {
            if expected > 0 {
                prop_assert_eq!(tree.count_of(prefix.as_str()), Some(expected));
            } else {
                prop_assert!(!tree.has(prefix.as_str()));
            }
        }
    }

    #[test]
    fn compare_is_reflexive_and_symmetric(a in overlapping_tag(), b in overlapping_tag()) {
        let a = TagChain::parse(&a).unwrap();
        let b = TagChain::parse(&b).unwrap();

        prop_assert!(compare(a.leaf(), a.leaf()));
        prop_assert!(compare_exact(a.leaf(), a.leaf()));
        prop_assert_eq!(compare(a.leaf(), b.leaf()), compare(b.leaf(), a.leaf()));
        prop_assert_eq!(
            compare_exact(a.leaf(), b.leaf()),
            compare_exact(b.leaf(), a.leaf())
        );
    }

    #[test]
    fn compare_exact_implies_compare(a in overlapping_tag(), b in overlapping_tag()) {
        let a = TagChain::parse(&a).unwrap();
        let b = TagChain::parse(&b).unwrap();

        if compare_exact(a.leaf(), b.leaf()) {
            prop_assert!(compare(a.leaf(), b.leaf()));
        }
        prop_assert_eq!(
            compare_exact(a.leaf(), b.leaf()),
            a.leaf().full_name() == b.leaf().full_name()
        );
    }

    #[test]
    fn live_and_pending_lineages_agree(tags in prop::collection::vec(overlapping_tag(), 1..10)) {
        let mut tree = TagTree::new();
        for tag in &tags {
            tree.add(tag).unwrap();
        }

        for tag in &tags {
            let pending = TagChain::parse(tag).unwrap();
            let live = tree.get(tag).unwrap();
            prop_assert!(compare_exact(live, pending.leaf()));
        }
    }

    #[test]
    fn operation_sequences_keep_invariants(ops in prop::collection::vec(op(), 0..40)) {
        let tree = apply_ops(&ops);

        let result = verify_tree(&tree);
        prop_assert!(result.ok, "{:?}", result.errors);
        prop_assert!(tree.get_state().records().iter().all(|r| r.count >= 1));
    }

    #[test]
    fn applying_own_state_is_noop(ops in prop::collection::vec(op(), 0..40)) {
        let mut tree = apply_ops(&ops);
        let before = tree.get_state();

        let changes = tree.apply_snapshot(&before, Notify::Emit).unwrap();

        prop_assert!(changes.is_empty());
        prop_assert_eq!(tree.get_state(), before);
    }

    #[test]
    fn snapshot_rebuilds_identical_tree(ops in prop::collection::vec(op(), 0..40)) {
        let tree = apply_ops(&ops);
        let state = tree.get_state();

        let wire = serialize_snapshot(&state).unwrap();
        let mut rebuilt = TagTree::new();
        rebuilt.apply_snapshot(&parse_snapshot(&wire).unwrap(), Notify::Silent).unwrap();

        prop_assert_eq!(rebuilt.get_state(), state);
    }

    #[test]
    fn reconciliation_reaches_target(
        from in prop::collection::vec(op(), 0..30),
        to in prop::collection::vec(op(), 0..30),
    ) {
        let mut tree = apply_ops(&from);
        let target = apply_ops(&to).get_state();

        tree.apply_snapshot(&target, Notify::Silent).unwrap();

        prop_assert_eq!(
            tree.get_state().fingerprint().unwrap(),
            target.fingerprint().unwrap()
        );
        prop_assert!(verify_tree(&tree).ok);
    }

    #[test]
    fn fingerprint_ignores_insertion_order(tags in prop::collection::vec(overlapping_tag(), 1..12)) {
        let mut forward = TagTree::new();
        for tag in &tags {
            forward.add(tag).unwrap();
        }
        let mut backward = TagTree::new();
        for tag in tags.iter().rev() {
            backward.add(tag).unwrap();
        }

        prop_assert_eq!(
            forward.get_state().fingerprint().unwrap(),
            backward.get_state().fingerprint().unwrap()
        );
    }
}

mod query_edge_cases {
    use super::*;

    #[test]
    fn empty_lists() {
        let mut tree = TagTree::new();
        let none: [&str; 0] = [];

        assert!(!tree.has_all(&none));
        assert!(!tree.has_any(&none));

        tree.add("a").unwrap();
        assert!(!tree.has_all(&none));
        assert!(tree.has_any(&none));
    }
}
