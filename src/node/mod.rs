//! Node representation and storage.
//!
//! Grove keeps its nodes in a slab arena ([`NodeStore`]) and addresses them
//! by stable [`NodeId`] indices. Ownership is a strict tree: a node is
//! reachable from exactly one parent slot, or from the tree handle if it is
//! the root. The doubly linked leaf chain holds plain ids that confer no
//! ownership, which is what lets safe Rust express the chain's back and
//! forward references without reference counting.
//!
//! ## Occupancy
//!
//! The tree is order 4: a node that reaches [`MAX_KEYS`] keys must split,
//! and after any completed public operation every non-root leaf holds at
//! least [`MIN_KEYS`] keys. Internal nodes obey the child-count invariant
//! `children.len() == keys.len() + 1` at all times.

/// Stable index of a node within a [`NodeStore`].
pub type NodeId = usize;

/// Maximum keys per node before a mandatory split (order-4 tree).
pub const MAX_KEYS: usize = 4;

/// Minimum keys per non-root leaf after any completed operation.
pub const MIN_KEYS: usize = MAX_KEYS / 2;

/// A single tree node: a leaf on the ordered chain, or an internal node
/// routing between `keys.len() + 1` children.
#[derive(Debug)]
pub enum Node<K> {
    Leaf {
        keys: Vec<K>,
        /// Previous leaf in the chain. Non-owning.
        prev: Option<NodeId>,
        /// Next leaf in the chain. Non-owning.
        next: Option<NodeId>,
    },
    Internal {
        keys: Vec<K>,
        children: Vec<NodeId>,
    },
}

impl<K> Node<K> {
    /// A fresh unlinked leaf.
    pub fn leaf() -> Self {
        Node::Leaf {
            keys: Vec::with_capacity(MAX_KEYS),
            prev: None,
            next: None,
        }
    }

    /// A fresh internal node with no children attached yet.
    pub fn internal() -> Self {
        Node::Internal {
            keys: Vec::with_capacity(MAX_KEYS),
            children: Vec::with_capacity(MAX_KEYS + 1),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn keys(&self) -> &[K] {
        match self {
            Node::Leaf { keys, .. } | Node::Internal { keys, .. } => keys,
        }
    }

    pub fn num_keys(&self) -> usize {
        self.keys().len()
    }
}

/// Slab arena of nodes with a free list of recycled slots.
///
/// Slots vacated by merges and root collapse are reused by later splits, so
/// ids stay stable for live nodes and the arena does not grow monotonically
/// under mixed workloads.
#[derive(Debug)]
pub struct NodeStore<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<NodeId>,
}

impl<K> NodeStore<K> {
    pub fn new() -> Self {
        NodeStore {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Place `node` into the arena and return its id.
    pub fn alloc(&mut self, node: Node<K>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Remove the node at `id` from the arena, returning ownership of it.
    /// The slot becomes available for reuse.
    ///
    /// # Panics
    /// Panics if `id` does not refer to a live node; that is an engine bug,
    /// not a runtime condition.
    pub fn remove(&mut self, id: NodeId) -> Node<K> {
        let node = self.slots[id].take().expect("removed a dead node id");
        self.free.push(id);
        node
    }

    /// Borrow the node at `id`.
    ///
    /// # Panics
    /// Panics on a dead id; see [`NodeStore::remove`].
    pub fn get(&self, id: NodeId) -> &Node<K> {
        self.slots[id].as_ref().expect("accessed a dead node id")
    }

    /// Mutably borrow the node at `id`.
    ///
    /// # Panics
    /// Panics on a dead id; see [`NodeStore::remove`].
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<K> {
        self.slots[id].as_mut().expect("accessed a dead node id")
    }

    /// Whether `id` refers to a live node. Used by verification.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.slots.get(id).is_some_and(Option::is_some)
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl<K> Default for NodeStore<K> {
    fn default() -> Self {
        Self::new()
    }
}
