use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::key::NativeOrd;
use crate::node::{Node, NodeId, MIN_KEYS};
use crate::tree::BPlusTree;

fn int_tree() -> BPlusTree<i32, NativeOrd<i32>> {
    BPlusTree::new(NativeOrd::new())
}

fn collect_range(tree: &BPlusTree<i32, NativeOrd<i32>>, lo: i32, hi: i32) -> Vec<i32> {
    let mut out = Vec::new();
    tree.range_scan(&lo, &hi, |k| out.push(*k));
    out
}

fn collect_all(tree: &BPlusTree<i32, NativeOrd<i32>>) -> Vec<i32> {
    let mut out = Vec::new();
    tree.scan_all(|k| out.push(*k));
    out
}

// ---------------------------------------------------------------------------
// Empty tree
// ---------------------------------------------------------------------------

#[test]
fn empty_tree_has_nothing() {
    let tree = int_tree();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.search(&1), None);
    assert!(collect_all(&tree).is_empty());
    assert!(collect_range(&tree, 0, 100).is_empty());
    assert_eq!(tree.dump(), "");
    tree.verify().unwrap();
}

#[test]
fn delete_from_empty_tree_returns_false() {
    let mut tree = int_tree();
    assert!(!tree.delete(&7));
}

// ---------------------------------------------------------------------------
// Insert & search
// ---------------------------------------------------------------------------

#[test]
fn insert_and_search_single_key() {
    let mut tree = int_tree();
    tree.insert(&42);
    assert_eq!(tree.search(&42), Some(&42));
    assert_eq!(tree.search(&41), None);
    assert_eq!(tree.len(), 1);
    assert!(!tree.is_empty());
    tree.verify().unwrap();
}

#[test]
fn caller_keeps_ownership_of_inserted_keys() {
    let mut tree: BPlusTree<String, NativeOrd<String>> = BPlusTree::new(NativeOrd::new());
    let key = String::from("vin-9001");
    tree.insert(&key);
    // The caller's value is untouched and droppable without harming the tree.
    drop(key);
    assert_eq!(tree.search(&String::from("vin-9001")).map(String::as_str), Some("vin-9001"));
}

#[test]
fn inserts_past_the_fanout_split_leaves() {
    let mut tree = int_tree();
    for n in 1..=8 {
        tree.insert(&n);
        tree.verify().unwrap();
    }
    assert_eq!(tree.len(), 8);
    for n in 1..=8 {
        assert_eq!(tree.search(&n), Some(&n), "missing key {n}");
    }
    assert_eq!(collect_all(&tree), (1..=8).collect::<Vec<_>>());
}

#[test]
fn insert_100_ascending_all_searchable() {
    let mut tree = int_tree();
    for n in 0..100 {
        tree.insert(&n);
    }
    tree.verify().unwrap();
    assert_eq!(tree.len(), 100);
    for n in 0..100 {
        assert_eq!(tree.search(&n), Some(&n), "missing key {n}");
    }
    assert_eq!(collect_all(&tree), (0..100).collect::<Vec<_>>());
}

#[test]
fn insert_200_descending_chain_is_sorted() {
    let mut tree = int_tree();
    for n in (0..200).rev() {
        tree.insert(&n);
    }
    tree.verify().unwrap();
    assert_eq!(tree.len(), 200);
    assert_eq!(collect_all(&tree), (0..200).collect::<Vec<_>>());
}

#[test]
fn insert_500_shuffled_chain_is_sorted() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut order: Vec<i32> = (0..500).collect();
    order.shuffle(&mut rng);

    let mut tree = int_tree();
    for n in &order {
        tree.insert(n);
    }
    tree.verify().unwrap();
    assert_eq!(tree.len(), 500);
    assert_eq!(collect_all(&tree), (0..500).collect::<Vec<_>>());
    for n in 0..500 {
        assert_eq!(tree.search(&n), Some(&n), "missing key {n}");
    }
}

// ---------------------------------------------------------------------------
// Duplicate keys
// ---------------------------------------------------------------------------

#[test]
fn duplicates_are_stored_not_replaced() {
    let mut tree = int_tree();
    tree.insert(&7);
    tree.insert(&7);
    tree.insert(&7);
    assert_eq!(tree.len(), 3);
    assert_eq!(collect_all(&tree), vec![7, 7, 7]);
    tree.verify().unwrap();
}

#[test]
fn duplicates_interleave_in_chain_order() {
    let mut tree = int_tree();
    for n in [3, 1, 3, 2, 1, 3] {
        tree.insert(&n);
    }
    assert_eq!(collect_all(&tree), vec![1, 1, 2, 3, 3, 3]);
    assert_eq!(collect_range(&tree, 3, 3), vec![3, 3, 3]);
    tree.verify().unwrap();
}

#[test]
fn delete_removes_one_duplicate_at_a_time() {
    let mut tree = int_tree();
    tree.insert(&5);
    tree.insert(&5);
    assert!(tree.delete(&5));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.search(&5), Some(&5));
    assert!(tree.delete(&5));
    assert_eq!(tree.search(&5), None);
    assert!(!tree.delete(&5));
}

// ---------------------------------------------------------------------------
// Range scan
// ---------------------------------------------------------------------------

#[test]
fn range_scan_bounds_are_inclusive() {
    let mut tree = int_tree();
    for n in 0..50 {
        tree.insert(&n);
    }
    assert_eq!(collect_range(&tree, 10, 20), (10..=20).collect::<Vec<_>>());
}

#[test]
fn range_scan_skips_below_lower_bound_within_first_leaf() {
    let mut tree = int_tree();
    for n in [1, 2, 3] {
        tree.insert(&n);
    }
    // All three keys share one leaf; only 2 and 3 are in range.
    assert_eq!(collect_range(&tree, 2, 3), vec![2, 3]);
}

#[test]
fn range_scan_with_absent_bounds() {
    let mut tree = int_tree();
    for n in [10, 20, 30, 40] {
        tree.insert(&n);
    }
    assert_eq!(collect_range(&tree, 15, 35), vec![20, 30]);
    assert_eq!(collect_range(&tree, -5, 15), vec![10]);
    assert_eq!(collect_range(&tree, 35, 99), vec![40]);
}

#[test]
fn inverted_range_visits_nothing() {
    let mut tree = int_tree();
    for n in 0..20 {
        tree.insert(&n);
    }
    assert!(collect_range(&tree, 15, 5).is_empty());
}

#[test]
fn range_outside_stored_keys_visits_nothing() {
    let mut tree = int_tree();
    for n in 10..20 {
        tree.insert(&n);
    }
    assert!(collect_range(&tree, 30, 40).is_empty());
    assert!(collect_range(&tree, 0, 9).is_empty());
}

// ---------------------------------------------------------------------------
// Delete: leaf-local cases
// ---------------------------------------------------------------------------

#[test]
fn delete_single_key() {
    let mut tree = int_tree();
    tree.insert(&1);
    assert!(tree.delete(&1));
    assert_eq!(tree.search(&1), None);
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    tree.verify().unwrap();
}

#[test]
fn delete_absent_key_changes_nothing() {
    let mut tree = int_tree();
    for n in 0..30 {
        tree.insert(&n);
    }
    let before = collect_all(&tree);
    assert!(!tree.delete(&99));
    assert_eq!(collect_all(&tree), before);
    tree.verify().unwrap();
}

#[test]
fn delete_then_reinsert() {
    let mut tree = int_tree();
    tree.insert(&5);
    assert!(tree.delete(&5));
    tree.insert(&5);
    assert_eq!(tree.search(&5), Some(&5));
    assert_eq!(tree.len(), 1);
}

// ---------------------------------------------------------------------------
// Delete: rebalancing
// ---------------------------------------------------------------------------

#[test]
fn underflow_borrows_from_right_sibling() {
    // Leaves [1,2] [3,4,5]; deleting 1 leaves a one-key leaf that borrows
    // from its right neighbour, refreshing the separator.
    let mut tree = int_tree();
    for n in 1..=5 {
        tree.insert(&n);
    }
    assert!(tree.delete(&1));
    tree.verify().unwrap();
    assert_eq!(collect_all(&tree), vec![2, 3, 4, 5]);
    for n in 2..=5 {
        assert_eq!(tree.search(&n), Some(&n), "missing key {n}");
    }
}

#[test]
fn underflow_borrows_from_left_sibling() {
    // Leaves [0,1,2] [3,4]; deleting 4 underflows the right leaf, which
    // borrows the left sibling's boundary key.
    let mut tree = int_tree();
    for n in [1, 2, 3, 4, 0] {
        tree.insert(&n);
    }
    assert!(tree.delete(&4));
    tree.verify().unwrap();
    assert_eq!(collect_all(&tree), vec![0, 1, 2, 3]);
    for n in 0..=3 {
        assert_eq!(tree.search(&n), Some(&n), "missing key {n}");
    }
}

#[test]
fn underflow_merges_when_no_sibling_has_surplus() {
    // Leaves [1,2] [3,4]; deleting 4 forces a merge and the root collapses
    // back to a single leaf.
    let mut tree = int_tree();
    for n in 1..=4 {
        tree.insert(&n);
    }
    assert!(tree.delete(&4));
    tree.verify().unwrap();
    assert_eq!(collect_all(&tree), vec![1, 2, 3]);
}

#[test]
fn deleting_a_separator_key_by_merge() {
    // Leaves [1,2] [3,4] with separator 3: neither child has surplus, so
    // the children merge and the original key is deleted from the merged
    // leaf.
    let mut tree = int_tree();
    for n in 1..=4 {
        tree.insert(&n);
    }
    assert!(tree.delete(&3));
    tree.verify().unwrap();
    assert_eq!(tree.search(&3), None);
    assert_eq!(collect_all(&tree), vec![1, 2, 4]);
}

#[test]
fn deleting_a_separator_key_by_successor_substitution() {
    // Leaves [1,2] [3,4,5] with separator 3: the right child has surplus,
    // so the successor (3 itself, the right subtree's minimum) replaces
    // the separator and is deleted below.
    let mut tree = int_tree();
    for n in 1..=5 {
        tree.insert(&n);
    }
    assert!(tree.delete(&3));
    tree.verify().unwrap();
    assert_eq!(tree.search(&3), None);
    assert_eq!(collect_all(&tree), vec![1, 2, 4, 5]);
}

#[test]
fn deleting_a_separator_key_by_predecessor_substitution() {
    // Leaves [0,1,2] [3,4] with separator 3: the left child has surplus,
    // so the left subtree's maximum replaces the separator and is deleted
    // below. One key leaves the tree and order is preserved.
    let mut tree = int_tree();
    for n in [1, 2, 3, 4, 0] {
        tree.insert(&n);
    }
    assert!(tree.delete(&3));
    tree.verify().unwrap();
    assert_eq!(tree.len(), 4);
    let all = collect_all(&tree);
    assert!(all.windows(2).all(|w| w[0] <= w[1]), "chain out of order: {all:?}");
}

/// Every internal node other than the root holds at least [`MIN_KEYS`]
/// keys. Stricter than `verify`, which only requires internal nodes to
/// carry a separator at all; rebalancing is expected to restore the full
/// floor on the path it repaired.
fn internal_floor_holds(tree: &BPlusTree<i32, NativeOrd<i32>>) -> bool {
    fn walk(tree: &BPlusTree<i32, NativeOrd<i32>>, id: NodeId, is_root: bool) -> bool {
        match tree.store.get(id) {
            Node::Leaf { .. } => true,
            Node::Internal { keys, children } => {
                if !is_root && keys.len() < MIN_KEYS {
                    return false;
                }
                children.iter().all(|&child| walk(tree, child, false))
            }
        }
    }
    match tree.root {
        None => true,
        Some(root) => walk(tree, root, true),
    }
}

#[test]
fn separator_merge_in_a_deep_tree_keeps_occupancy_bounded() {
    // Deleting a key that matches the root separator when neither internal
    // child can spare one merges the two children into a node past the
    // fanout; the merged node must be split again before the operation
    // completes.
    let mut tree = int_tree();
    for n in (0..=1100).step_by(100) {
        tree.insert(&n);
    }
    tree.insert(&450);
    assert!(tree.delete(&600));
    tree.verify().unwrap();
    assert_eq!(tree.len(), 12);
    let all = collect_all(&tree);
    assert!(all.windows(2).all(|w| w[0] <= w[1]), "chain out of order: {all:?}");
}

#[test]
fn failed_delete_against_a_stale_separator_still_rebalances() {
    let mut tree = int_tree();
    for n in (0..=1100).step_by(100) {
        tree.insert(&n);
    }
    tree.insert(&450);
    // Successor substitution removes the stored 400 but leaves a separator
    // carrying that value, so the repeat delete finds a separator match
    // with no key behind it.
    assert!(tree.delete(&400));
    assert_eq!(tree.search(&400), None);
    // The miss still merges the two children around the stale separator;
    // the node the merge drained must be rebalanced on the way back up.
    assert!(!tree.delete(&400));
    tree.verify().unwrap();
    assert_eq!(tree.len(), 12);
    assert!(internal_floor_holds(&tree), "an internal node was left under the floor");
}

#[test]
fn ascending_drain_empties_the_tree() {
    let mut tree = int_tree();
    for n in 0..60 {
        tree.insert(&n);
    }
    for n in 0..60 {
        assert!(tree.delete(&n), "failed to delete {n}");
        assert_eq!(tree.search(&n), None, "{n} still present after delete");
        assert_eq!(tree.len(), (59 - n) as usize);
        tree.verify().unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn descending_drain_keeps_structure_sound() {
    let mut tree = int_tree();
    for n in 0..60 {
        tree.insert(&n);
    }
    for n in (0..60).rev() {
        assert!(tree.delete(&n), "failed to delete {n}");
        assert_eq!(tree.len(), n as usize);
        let all = collect_all(&tree);
        assert!(all.windows(2).all(|w| w[0] <= w[1]), "chain out of order after deleting {n}");
        tree.verify().unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn drained_tree_accepts_new_inserts() {
    let mut tree = int_tree();
    for n in 0..10 {
        tree.insert(&n);
    }
    for n in 0..10 {
        assert!(tree.delete(&n));
    }
    assert!(tree.is_empty());

    tree.insert(&100);
    tree.insert(&50);
    assert_eq!(collect_all(&tree), vec![50, 100]);
    tree.verify().unwrap();
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[test]
fn dump_renders_the_chain_in_order() {
    let mut tree = int_tree();
    for n in [3, 1, 2] {
        tree.insert(&n);
    }
    assert_eq!(tree.dump(), "1 2 3");
}
