//! # B+Tree
//!
//! The ordered index engine at the heart of Grove. Keys live only in leaf
//! nodes; internal nodes hold separator copies that route descent. The
//! leaves form a doubly linked chain in ascending comparator order, so a
//! range scan is one descent plus a forward walk along the chain and never
//! re-enters the tree.
//!
//! The tree handle owns the root (absent for an empty tree, a single leaf
//! after the first insert, a multi-level structure after root splits) and
//! the [`KeyOps`] capability set that defines the only total order the
//! tree ever uses. Every stored key is a clone made at insertion time;
//! callers keep ownership of everything they pass in, including partially
//! populated probe keys used purely for comparison.
//!
//! Duplicate keys are permitted. `find_insert_pos` places an incoming key
//! after any equal keys and descends to the right of an equal separator;
//! callers wanting unique keys search before inserting.
//!
//! The tree is single-threaded: each public operation is one atomic
//! in-memory structural change (or pure read). Concurrent use requires an
//! external mutual-exclusion wrapper owned by the caller.

mod delete;
mod insert;
mod verify;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use crate::key::KeyOps;
use crate::node::{Node, NodeId, NodeStore};

/// An order-4 B+ tree parametrised over an opaque key type `K` through the
/// capability set `O`.
pub struct BPlusTree<K, O: KeyOps<K>> {
    store: NodeStore<K>,
    root: Option<NodeId>,
    ops: O,
}

impl<K, O: KeyOps<K>> BPlusTree<K, O> {
    /// Create an empty tree owning the given capability set.
    pub fn new(ops: O) -> Self {
        BPlusTree {
            store: NodeStore::new(),
            root: None,
            ops,
        }
    }

    /// Borrow the capability set this tree was built with.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Look up a single key. Returns a reference to the tree's stored clone
    /// if a comparator-equal key exists, `None` otherwise.
    ///
    /// The probe may be a partially populated scratch value; only the fields
    /// the comparator reads matter. The returned reference borrows the tree,
    /// so it is valid exactly until the next structural mutation.
    pub fn search(&self, probe: &K) -> Option<&K> {
        let leaf_id = self.find_leaf(probe)?;
        self.store
            .get(leaf_id)
            .keys()
            .iter()
            .find(|stored| self.ops.cmp(stored, probe) == Ordering::Equal)
    }

    /// Walk down the tree to the leaf that would contain `key`. `None` only
    /// for an empty tree.
    fn find_leaf(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            match self.store.get(current) {
                Node::Leaf { .. } => return Some(current),
                Node::Internal { children, .. } => {
                    let pos = self.find_insert_pos(current, key);
                    current = children[pos];
                }
            }
        }
    }

    /// First index `i` in `node` such that `keys[i] > key`; equivalently,
    /// the number of keys that are `<= key`.
    ///
    /// At an internal node this selects the descent child, sending a key
    /// equal to a separator to the right of it. At a leaf it places a new
    /// key immediately after any existing equal keys.
    fn find_insert_pos(&self, node: NodeId, key: &K) -> usize {
        let keys = self.store.get(node).keys();
        keys.iter()
            .position(|stored| self.ops.cmp(stored, key) == Ordering::Greater)
            .unwrap_or(keys.len())
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    /// Visit every key in `[lower, upper]` (both bounds inclusive) in
    /// ascending order.
    ///
    /// The scan descends to the leaf that would contain `lower`, skips keys
    /// below the bound within that leaf, then walks the chain forward until
    /// the first key above `upper`. An empty or inverted range visits
    /// nothing.
    pub fn range_scan<F: FnMut(&K)>(&self, lower: &K, upper: &K, mut visit: F) {
        let Some(start) = self.find_leaf(lower) else {
            return;
        };
        let mut current = Some(start);
        while let Some(id) = current {
            let Node::Leaf { keys, next, .. } = self.store.get(id) else {
                return;
            };
            for key in keys {
                // Keys below the lower bound are skipped, never
                // scan-terminating.
                if self.ops.cmp(key, lower) == Ordering::Less {
                    continue;
                }
                // Leaf-chain order is globally ascending, so nothing past
                // the first key above the upper bound can match.
                if self.ops.cmp(key, upper) == Ordering::Greater {
                    return;
                }
                visit(key);
            }
            current = *next;
        }
    }

    /// Visit every stored key in ascending order.
    pub fn scan_all<F: FnMut(&K)>(&self, mut visit: F) {
        let mut current = self.first_leaf();
        while let Some(id) = current {
            let Node::Leaf { keys, next, .. } = self.store.get(id) else {
                return;
            };
            for key in keys {
                visit(key);
            }
            current = *next;
        }
    }

    /// Total number of stored keys, counted along the leaf chain.
    pub fn len(&self) -> usize {
        let mut total = 0;
        let mut current = self.first_leaf();
        while let Some(id) = current {
            let Node::Leaf { keys, next, .. } = self.store.get(id) else {
                break;
            };
            total += keys.len();
            current = *next;
        }
        total
    }

    /// Whether the tree stores no keys. A fully drained tree keeps an
    /// empty leaf root, so this cannot just test for the root's absence.
    pub fn is_empty(&self) -> bool {
        match self.root {
            None => true,
            Some(root) => match self.store.get(root) {
                Node::Leaf { keys, .. } => keys.is_empty(),
                Node::Internal { .. } => false,
            },
        }
    }

    /// The head of the leaf chain, reached by always descending into the
    /// first child.
    fn first_leaf(&self) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            match self.store.get(current) {
                Node::Leaf { .. } => return Some(current),
                Node::Internal { children, .. } => current = children[0],
            }
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Render the leaf chain end to end using the capability set's
    /// `describe`, space-separated. Diagnostics only.
    pub fn dump(&self) -> String {
        let mut parts = Vec::new();
        self.scan_all(|key| parts.push(self.ops.describe(key)));
        parts.join(" ")
    }
}
