//! Insertion and overflow splitting.

use crate::key::KeyOps;
use crate::node::{Node, NodeId, MAX_KEYS};

use super::BPlusTree;

/// When an insertion causes a node to split, the caller must insert
/// `(promoted, new_node)` into the parent.
pub(super) enum InsertResult<K> {
    /// The insertion was absorbed without a split.
    Done,
    /// The node was split; `new_node` is the new right sibling and
    /// `promoted` its separator.
    Split { promoted: K, new_node: NodeId },
}

impl<K, O: KeyOps<K>> BPlusTree<K, O> {
    /// Insert a clone of `key`, keeping the caller's value untouched.
    ///
    /// Always succeeds (allocation failure is fatal). Duplicates are
    /// permitted: a key equal to existing ones is placed immediately after
    /// them, so a later range scan yields every copy.
    pub fn insert(&mut self, key: &K) {
        let Some(root) = self.root else {
            // First insert: a single leaf becomes the root.
            let leaf = Node::Leaf {
                keys: vec![self.ops.clone_key(key)],
                prev: None,
                next: None,
            };
            self.root = Some(self.store.alloc(leaf));
            return;
        };

        if let InsertResult::Split { promoted, new_node } = self.insert_recursive(root, key) {
            // The root split: grow the tree by one level with a fresh
            // two-child internal root.
            let new_root = self.store.alloc(Node::Internal {
                keys: vec![promoted],
                children: vec![root, new_node],
            });
            self.root = Some(new_root);
            tracing::debug!(old_root = root, new_root, "root split, tree height grew");
        }
    }

    /// Recursively insert into the subtree rooted at `node_id`.
    fn insert_recursive(&mut self, node_id: NodeId, key: &K) -> InsertResult<K> {
        let pos = self.find_insert_pos(node_id, key);
        let descend = match self.store.get(node_id) {
            Node::Leaf { .. } => None,
            Node::Internal { children, .. } => Some(children[pos]),
        };

        let Some(child) = descend else {
            // Leaf: clone into the slot `find_insert_pos` chose, then split
            // if the node reached the fanout.
            let cloned = self.ops.clone_key(key);
            if let Node::Leaf { keys, .. } = self.store.get_mut(node_id) {
                keys.insert(pos, cloned);
            }
            if self.store.get(node_id).num_keys() < MAX_KEYS {
                return InsertResult::Done;
            }
            return self.split_leaf(node_id);
        };

        match self.insert_recursive(child, key) {
            InsertResult::Done => InsertResult::Done,
            InsertResult::Split { promoted, new_node } => {
                // The child at `pos` split: its promoted separator and new
                // right sibling slot in right after it.
                if let Node::Internal { keys, children } = self.store.get_mut(node_id) {
                    keys.insert(pos, promoted);
                    children.insert(pos + 1, new_node);
                }
                if self.store.get(node_id).num_keys() < MAX_KEYS {
                    InsertResult::Done
                } else {
                    self.split_internal(node_id)
                }
            }
        }
    }

    /// Split a full leaf. The upper half of the keys moves into a new right
    /// sibling, which is spliced into the leaf chain directly after the
    /// original. The promoted separator is a fresh clone of the new leaf's
    /// first key; that key legitimately exists in both the leaf and the
    /// parent, since all authoritative data lives in leaves.
    fn split_leaf(&mut self, leaf_id: NodeId) -> InsertResult<K> {
        let mid = MAX_KEYS / 2;
        let (upper, old_next) = match self.store.get_mut(leaf_id) {
            Node::Leaf { keys, next, .. } => (keys.split_off(mid), next.take()),
            Node::Internal { .. } => unreachable!("split_leaf on an internal node"),
        };

        let promoted = self.ops.clone_key(&upper[0]);
        let new_id = self.store.alloc(Node::Leaf {
            keys: upper,
            prev: Some(leaf_id),
            next: old_next,
        });
        if let Node::Leaf { next, .. } = self.store.get_mut(leaf_id) {
            *next = Some(new_id);
        }
        if let Some(right) = old_next {
            if let Node::Leaf { prev, .. } = self.store.get_mut(right) {
                *prev = Some(new_id);
            }
        }

        tracing::trace!(leaf = leaf_id, new_leaf = new_id, "leaf split");
        InsertResult::Split {
            promoted,
            new_node: new_id,
        }
    }

    /// Split an internal node at or past the fanout. `keys[mid]` is promoted
    /// by value, since internal separators are routing data and are never
    /// duplicated, and everything strictly above it moves into the new right
    /// sibling. Also used by deletion when a separator merge overfills the
    /// merged node.
    pub(super) fn split_internal(&mut self, node_id: NodeId) -> InsertResult<K> {
        let mid = MAX_KEYS / 2;
        let (promoted, upper_keys, upper_children) = match self.store.get_mut(node_id) {
            Node::Internal { keys, children } => {
                let upper_keys = keys.split_off(mid + 1);
                let promoted = keys.pop().expect("internal node splits at the fanout");
                let upper_children = children.split_off(mid + 1);
                (promoted, upper_keys, upper_children)
            }
            Node::Leaf { .. } => unreachable!("split_internal on a leaf"),
        };

        let new_id = self.store.alloc(Node::Internal {
            keys: upper_keys,
            children: upper_children,
        });

        tracing::trace!(node = node_id, new_node = new_id, "internal split");
        InsertResult::Split {
            promoted,
            new_node: new_id,
        }
    }
}
