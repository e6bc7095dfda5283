//! Deletion and underflow rebalancing.
//!
//! Descent carries the parent id and child index implicitly through the
//! call chain: each level recurses into one child and, on return, repairs
//! that child if it fell below minimum occupancy, first by borrowing a key
//! from a sibling with surplus, else by merging with a sibling. A merge
//! removes a separator and a child pointer from the parent, which may push
//! the parent itself under the floor; that is repaired one level further up
//! in the same chain. Repair runs whether or not the probe was found, since
//! a merge performed on the way down must be cleaned up even when the
//! delete below it misses. Merging the two internal children around a
//! matched separator can overfill the merged node; it is split again once
//! the delete inside it completes. The root is exempt from the floor and
//! collapses into its sole child when a merge empties it.

use std::cmp::Ordering;
use std::mem;

use crate::key::KeyOps;
use crate::node::{Node, NodeId, MAX_KEYS, MIN_KEYS};

use super::insert::InsertResult;
use super::BPlusTree;

impl<K, O: KeyOps<K>> BPlusTree<K, O> {
    /// Remove one key comparator-equal to `probe`. Returns `true` iff a
    /// matching key was removed; an absent key leaves the tree exactly as
    /// it was.
    pub fn delete(&mut self, probe: &K) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let removed = self.delete_recursive(root, probe);

        // An internal root emptied by a merge hands the tree to its sole
        // remaining child and the height shrinks by one. A leaf root may
        // hold arbitrarily few keys.
        let collapse = match self.store.get(root) {
            Node::Internal { keys, children } if keys.is_empty() => Some(children[0]),
            _ => None,
        };
        if let Some(child) = collapse {
            self.store.remove(root);
            self.root = Some(child);
            tracing::debug!(old_root = root, new_root = child, "root collapsed");
        }

        removed
    }

    /// Delete `probe` from the subtree rooted at `node_id`. Underflow of
    /// `node_id` itself is the caller's responsibility.
    fn delete_recursive(&mut self, node_id: NodeId, probe: &K) -> bool {
        // Lower bound: first slot whose key is not below the probe.
        let key_idx = {
            let keys = self.store.get(node_id).keys();
            keys.iter()
                .position(|k| self.ops.cmp(k, probe) != Ordering::Less)
                .unwrap_or(keys.len())
        };

        if self.store.get(node_id).is_leaf() {
            // Exact-match scan; a miss means the key is nowhere in the tree.
            let found = self
                .store
                .get(node_id)
                .keys()
                .iter()
                .position(|k| self.ops.cmp(k, probe) == Ordering::Equal);
            let Some(idx) = found else {
                return false;
            };
            if let Node::Leaf { keys, .. } = self.store.get_mut(node_id) {
                keys.remove(idx);
            }
            return true;
        }

        let separator_match = {
            let keys = self.store.get(node_id).keys();
            key_idx < keys.len() && self.ops.cmp(&keys[key_idx], probe) == Ordering::Equal
        };
        if separator_match {
            return self.delete_at_separator(node_id, key_idx, probe);
        }

        // Descend on the side the comparator indicates, then repair the
        // child if it sits under the floor. The repair cannot depend on the
        // probe having been found: a separator merge below may have pulled
        // a key out of the child even when the delete itself missed.
        let child = match self.store.get(node_id) {
            Node::Internal { children, .. } => children[key_idx],
            Node::Leaf { .. } => unreachable!("leaves are handled above"),
        };
        let removed = self.delete_recursive(child, probe);
        if self.store.get(child).num_keys() < MIN_KEYS {
            self.rebalance(child, node_id, key_idx);
        }
        removed
    }

    /// The separator at `node_id.keys[key_idx]` equals the probe. Replace
    /// it via the predecessor or successor if a neighbouring child has
    /// surplus, else merge the two children around it and retry the
    /// original key inside the merged child, re-splitting the merged node
    /// if the merge overfilled it.
    fn delete_at_separator(&mut self, node_id: NodeId, key_idx: usize, probe: &K) -> bool {
        let (left, right) = match self.store.get(node_id) {
            Node::Internal { children, .. } => (children[key_idx], children[key_idx + 1]),
            Node::Leaf { .. } => unreachable!("separators live in internal nodes"),
        };

        if self.store.get(left).num_keys() > MIN_KEYS {
            // Substitute the predecessor: the maximum of the left subtree
            // replaces the separator, then gets deleted from below.
            let replacement = self.subtree_max_clone(left);
            let separator = self.ops.clone_key(&replacement);
            if let Node::Internal { keys, .. } = self.store.get_mut(node_id) {
                keys[key_idx] = separator;
            }
            let removed = self.delete_recursive(left, &replacement);
            if self.store.get(left).num_keys() < MIN_KEYS {
                self.rebalance(left, node_id, key_idx);
            }
            removed
        } else if self.store.get(right).num_keys() > MIN_KEYS {
            // Symmetric: substitute the successor from the right subtree.
            let replacement = self.subtree_min_clone(right);
            let separator = self.ops.clone_key(&replacement);
            if let Node::Internal { keys, .. } = self.store.get_mut(node_id) {
                keys[key_idx] = separator;
            }
            let removed = self.delete_recursive(right, &replacement);
            if self.store.get(right).num_keys() < MIN_KEYS {
                self.rebalance(right, node_id, key_idx + 1);
            }
            removed
        } else {
            // Neither side can spare a key: merge both children around the
            // separator and delete the original key from the merged child.
            self.merge(node_id, key_idx, left, right);
            let removed = self.delete_recursive(left, probe);
            if self.store.get(left).num_keys() < MIN_KEYS {
                self.rebalance(left, node_id, key_idx);
            } else if self.store.get(left).num_keys() > MAX_KEYS {
                // Merging two internal children pulled the separator down
                // into a node past the fanout. Split it again and hand the
                // promoted separator back to the parent, which regains the
                // key slot the merge vacated.
                let InsertResult::Split { promoted, new_node } = self.split_internal(left) else {
                    unreachable!("splitting an overfull node always yields a sibling");
                };
                if let Node::Internal { keys, children } = self.store.get_mut(node_id) {
                    keys.insert(key_idx, promoted);
                    children.insert(key_idx + 1, new_node);
                }
            }
            removed
        }
    }

    // -----------------------------------------------------------------------
    // Rebalancing
    // -----------------------------------------------------------------------

    /// Repair an underfull child: borrow from the left sibling, else borrow
    /// from the right sibling, else merge. A no-op when the parent has no
    /// other children (an emptied root, collapsed by the caller).
    fn rebalance(&mut self, node_id: NodeId, parent_id: NodeId, child_idx: usize) {
        let (left_sib, right_sib) = match self.store.get(parent_id) {
            Node::Internal { children, .. } => (
                child_idx.checked_sub(1).map(|i| children[i]),
                children.get(child_idx + 1).copied(),
            ),
            Node::Leaf { .. } => unreachable!("a parent is always internal"),
        };

        if let Some(left) = left_sib {
            if self.store.get(left).num_keys() > MIN_KEYS {
                self.rotate_from_left(parent_id, child_idx, left, node_id);
                return;
            }
        }
        if let Some(right) = right_sib {
            if self.store.get(right).num_keys() > MIN_KEYS {
                self.rotate_from_right(parent_id, child_idx, node_id, right);
                return;
            }
        }
        if let Some(left) = left_sib {
            self.merge(parent_id, child_idx - 1, left, node_id);
        } else if let Some(right) = right_sib {
            self.merge(parent_id, child_idx, node_id, right);
        }
    }

    /// Rotate one key rightward from a left sibling with surplus into the
    /// underfull node, through the parent separator at `child_idx - 1`.
    fn rotate_from_left(&mut self, parent_id: NodeId, child_idx: usize, left: NodeId, node_id: NodeId) {
        let sep_idx = child_idx - 1;
        tracing::trace!(from = left, to = node_id, "borrow from left sibling");

        if self.store.get(node_id).is_leaf() {
            // A data key crosses the boundary; the separator is refreshed
            // to the receiving node's new first key.
            let moved = match self.store.get_mut(left) {
                Node::Leaf { keys, .. } => keys.pop().expect("donor sibling has surplus"),
                Node::Internal { .. } => unreachable!("siblings share a level"),
            };
            if let Node::Leaf { keys, .. } = self.store.get_mut(node_id) {
                keys.insert(0, moved);
            }
            let fresh = self.ops.clone_key(&self.store.get(node_id).keys()[0]);
            if let Node::Internal { keys, .. } = self.store.get_mut(parent_id) {
                keys[sep_idx] = fresh;
            }
        } else {
            // Internal rotation: the separator swaps down into the node,
            // the sibling's boundary key becomes the new separator, and one
            // child pointer crosses with it.
            let (donated_key, donated_child) = match self.store.get_mut(left) {
                Node::Internal { keys, children } => (
                    keys.pop().expect("donor sibling has surplus"),
                    children.pop().expect("internal child count tracks keys"),
                ),
                Node::Leaf { .. } => unreachable!("siblings share a level"),
            };
            let old_sep = match self.store.get_mut(parent_id) {
                Node::Internal { keys, .. } => mem::replace(&mut keys[sep_idx], donated_key),
                Node::Leaf { .. } => unreachable!("a parent is always internal"),
            };
            if let Node::Internal { keys, children } = self.store.get_mut(node_id) {
                keys.insert(0, old_sep);
                children.insert(0, donated_child);
            }
        }
    }

    /// Rotate one key leftward from a right sibling with surplus into the
    /// underfull node, through the parent separator at `child_idx`.
    fn rotate_from_right(&mut self, parent_id: NodeId, child_idx: usize, node_id: NodeId, right: NodeId) {
        let sep_idx = child_idx;
        tracing::trace!(from = right, to = node_id, "borrow from right sibling");

        if self.store.get(node_id).is_leaf() {
            let moved = match self.store.get_mut(right) {
                Node::Leaf { keys, .. } => keys.remove(0),
                Node::Internal { .. } => unreachable!("siblings share a level"),
            };
            if let Node::Leaf { keys, .. } = self.store.get_mut(node_id) {
                keys.push(moved);
            }
            // The right sibling's smallest key changed; the separator must
            // follow it.
            let fresh = self.ops.clone_key(&self.store.get(right).keys()[0]);
            if let Node::Internal { keys, .. } = self.store.get_mut(parent_id) {
                keys[sep_idx] = fresh;
            }
        } else {
            let (donated_key, donated_child) = match self.store.get_mut(right) {
                Node::Internal { keys, children } => (keys.remove(0), children.remove(0)),
                Node::Leaf { .. } => unreachable!("siblings share a level"),
            };
            let old_sep = match self.store.get_mut(parent_id) {
                Node::Internal { keys, .. } => mem::replace(&mut keys[sep_idx], donated_key),
                Node::Leaf { .. } => unreachable!("a parent is always internal"),
            };
            if let Node::Internal { keys, children } = self.store.get_mut(node_id) {
                keys.push(old_sep);
                children.push(donated_child);
            }
        }
    }

    /// Merge the right sibling into the left around the parent separator at
    /// `sep_idx`. For internal nodes the separator is pulled down into the
    /// merged node; for leaves it is a redundant copy and is dropped, and
    /// the chain is spliced to skip the removed leaf. The right node's slot
    /// returns to the arena.
    fn merge(&mut self, parent_id: NodeId, sep_idx: usize, left: NodeId, right: NodeId) {
        tracing::trace!(left, right, parent = parent_id, "merge siblings");

        let separator = match self.store.get_mut(parent_id) {
            Node::Internal { keys, children } => {
                children.remove(sep_idx + 1);
                keys.remove(sep_idx)
            }
            Node::Leaf { .. } => unreachable!("a parent is always internal"),
        };

        match self.store.remove(right) {
            Node::Leaf {
                keys: right_keys,
                next: right_next,
                ..
            } => {
                if let Node::Leaf { keys, next, .. } = self.store.get_mut(left) {
                    keys.extend(right_keys);
                    *next = right_next;
                }
                if let Some(after) = right_next {
                    if let Node::Leaf { prev, .. } = self.store.get_mut(after) {
                        *prev = Some(left);
                    }
                }
                // `separator` was a copy of a leaf key; dropping it here is
                // the moment the tree stops owning it.
                drop(separator);
            }
            Node::Internal {
                keys: right_keys,
                children: right_children,
            } => {
                if let Node::Internal { keys, children } = self.store.get_mut(left) {
                    keys.push(separator);
                    keys.extend(right_keys);
                    children.extend(right_children);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Predecessor / successor lookup
    // -----------------------------------------------------------------------

    /// Clone of the maximum key in the subtree at `id` (rightmost descent).
    fn subtree_max_clone(&self, mut id: NodeId) -> K {
        loop {
            match self.store.get(id) {
                Node::Internal { children, .. } => {
                    id = children[children.len() - 1];
                }
                Node::Leaf { keys, .. } => {
                    let last = keys.last().expect("leaves on a descent path are never empty");
                    return self.ops.clone_key(last);
                }
            }
        }
    }

    /// Clone of the minimum key in the subtree at `id` (leftmost descent).
    fn subtree_min_clone(&self, mut id: NodeId) -> K {
        loop {
            match self.store.get(id) {
                Node::Internal { children, .. } => id = children[0],
                Node::Leaf { keys, .. } => {
                    let first = keys.first().expect("leaves on a descent path are never empty");
                    return self.ops.clone_key(first);
                }
            }
        }
    }
}
