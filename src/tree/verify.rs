//! Structural invariant verification.
//!
//! `verify` walks the whole tree and reports the first violated invariant
//! as a categorised [`GroveError`]. In correct single-threaded use it never
//! fires; it exists for the test suite and as a debugging aid for
//! embedders. Checked invariants:
//!
//! - every referenced node id resolves to a live arena slot;
//! - keys within each node are in non-decreasing comparator order;
//! - no node exceeds the fanout; internal child count is key count + 1;
//! - non-root leaves hold at least the minimum occupancy, non-root
//!   internal nodes at least one key;
//! - all leaves sit at equal depth;
//! - the leaf chain's prev/next links mirror each other, its order never
//!   regresses across a leaf boundary, and it covers exactly the keys the
//!   tree stores.

use std::cmp::Ordering;

use crate::error::{GroveError, Result};
use crate::key::KeyOps;
use crate::node::{Node, NodeId, MAX_KEYS, MIN_KEYS};

use super::BPlusTree;

impl<K, O: KeyOps<K>> BPlusTree<K, O> {
    /// Check every structural invariant, returning the first violation.
    pub fn verify(&self) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };

        let mut leaf_depth = None;
        let stored = self.verify_node(root, true, 0, &mut leaf_depth)?;
        let chained = self.verify_chain()?;
        if stored != chained {
            return Err(GroveError::BrokenLeafChain(format!(
                "chain covers {chained} of {stored} stored keys"
            )));
        }
        Ok(())
    }

    /// Recursively check the subtree at `id`; returns the number of keys
    /// stored in its leaves.
    fn verify_node(
        &self,
        id: NodeId,
        is_root: bool,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        if !self.store.is_live(id) {
            return Err(GroveError::NodeNotFound(id));
        }
        let node = self.store.get(id);

        let keys = node.keys();
        if keys.len() > MAX_KEYS {
            return Err(GroveError::NodeOverflow {
                node: id,
                keys: keys.len(),
            });
        }
        for pair in keys.windows(2) {
            if self.ops.cmp(&pair[0], &pair[1]) == Ordering::Greater {
                return Err(GroveError::UnsortedNode(id));
            }
        }

        match node {
            Node::Leaf { keys, .. } => {
                if !is_root && keys.len() < MIN_KEYS {
                    return Err(GroveError::NodeUnderflow {
                        node: id,
                        keys: keys.len(),
                    });
                }
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(GroveError::UnevenLeafDepth {
                            expected,
                            found: depth,
                        });
                    }
                    Some(_) => {}
                }
                Ok(keys.len())
            }
            Node::Internal { keys, children } => {
                if children.len() != keys.len() + 1 {
                    return Err(GroveError::ChildCountMismatch {
                        node: id,
                        keys: keys.len(),
                        children: children.len(),
                    });
                }
                // Order-4 internal splits legitimately leave a one-key
                // right sibling, so internal nodes are only required to
                // hold a separator at all.
                if !is_root && keys.is_empty() {
                    return Err(GroveError::NodeUnderflow { node: id, keys: 0 });
                }
                let mut total = 0;
                for &child in children {
                    total += self.verify_node(child, false, depth + 1, leaf_depth)?;
                }
                Ok(total)
            }
        }
    }

    /// Walk the leaf chain, checking linkage and cross-boundary order;
    /// returns the number of keys seen.
    fn verify_chain(&self) -> Result<usize> {
        let Some(first) = self.first_leaf() else {
            return Ok(0);
        };

        if let Node::Leaf { prev: Some(p), .. } = self.store.get(first) {
            return Err(GroveError::BrokenLeafChain(format!(
                "first leaf {first} has a prev link to {p}"
            )));
        }

        let mut count = 0;
        let mut current = first;
        loop {
            if !self.store.is_live(current) {
                return Err(GroveError::NodeNotFound(current));
            }
            let Node::Leaf { keys, next, .. } = self.store.get(current) else {
                return Err(GroveError::BrokenLeafChain(format!(
                    "chain reached internal node {current}"
                )));
            };
            count += keys.len();

            let Some(next_id) = *next else {
                return Ok(count);
            };
            if !self.store.is_live(next_id) {
                return Err(GroveError::NodeNotFound(next_id));
            }
            let Node::Leaf {
                keys: next_keys,
                prev: next_prev,
                ..
            } = self.store.get(next_id)
            else {
                return Err(GroveError::BrokenLeafChain(format!(
                    "chain reached internal node {next_id}"
                )));
            };
            if *next_prev != Some(current) {
                return Err(GroveError::BrokenLeafChain(format!(
                    "prev link of node {next_id} does not point back to {current}"
                )));
            }
            if let (Some(last), Some(first_of_next)) = (keys.last(), next_keys.first()) {
                if self.ops.cmp(last, first_of_next) == Ordering::Greater {
                    return Err(GroveError::BrokenLeafChain(format!(
                        "order regresses between nodes {current} and {next_id}"
                    )));
                }
            }
            current = next_id;
        }
    }
}
