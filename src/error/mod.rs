//! Unified error handling for Grove.
//!
//! This module defines [`GroveError`], the error type returned by the
//! structural checks in [`crate::tree::BPlusTree::verify`].
//!
//! Grove deliberately keeps its error surface small. A missing key is not
//! an error: `search` returns `Option` and `delete` returns `bool`.
//! Allocation failure is fatal and surfaces through the global allocator,
//! never as a silent no-op. What remains are structural-invariant
//! violations, conditions that indicate a bug in the engine itself, which
//! `verify` reports as categorised values so that tests and embedders can
//! match on the violated invariant without inspecting free-form strings.
//!
//! A convenience [`Result<T>`] type alias is re-exported so that callers
//! can write `Result<T>` instead of `std::result::Result<T, GroveError>`.

use std::fmt;

use crate::node::NodeId;

/// The canonical error type for Grove's structural checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroveError {
    /// An internal node's child count does not equal its key count + 1.
    ChildCountMismatch {
        node: NodeId,
        keys: usize,
        children: usize,
    },

    /// A node holds more keys than the fanout permits.
    NodeOverflow { node: NodeId, keys: usize },

    /// A non-root node holds fewer keys than its minimum occupancy.
    NodeUnderflow { node: NodeId, keys: usize },

    /// Keys within a single node are not in comparator order.
    UnsortedNode(NodeId),

    /// Two leaves sit at different depths.
    UnevenLeafDepth { expected: usize, found: usize },

    /// The leaf chain is inconsistent: a prev/next link does not mirror its
    /// counterpart, the chain order regresses, or the chain disagrees with
    /// the tree about which keys exist.
    BrokenLeafChain(String),

    /// A node id does not resolve to a live arena slot.
    NodeNotFound(NodeId),

    /// An internal invariant was violated in a way not covered by the
    /// categories above. This usually indicates a bug in the engine itself
    /// and should be reported.
    Internal(String),
}

impl fmt::Display for GroveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroveError::ChildCountMismatch {
                node,
                keys,
                children,
            } => write!(
                f,
                "child count mismatch: node {node} has {keys} keys but {children} children"
            ),
            GroveError::NodeOverflow { node, keys } => {
                write!(f, "node overflow: node {node} holds {keys} keys")
            }
            GroveError::NodeUnderflow { node, keys } => {
                write!(f, "node underflow: node {node} holds {keys} keys")
            }
            GroveError::UnsortedNode(node) => {
                write!(f, "unsorted node: keys out of order in node {node}")
            }
            GroveError::UnevenLeafDepth { expected, found } => {
                write!(
                    f,
                    "uneven leaf depth: expected {expected}, found a leaf at {found}"
                )
            }
            GroveError::BrokenLeafChain(msg) => write!(f, "broken leaf chain: {msg}"),
            GroveError::NodeNotFound(node) => write!(f, "node not found: {node}"),
            GroveError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GroveError {}

/// A specialised [`Result`] type for Grove operations.
///
/// This is defined as a convenience so that the verification code can simply
/// return `Result<T>` rather than spelling out the full
/// `std::result::Result<T, GroveError>`.
pub type Result<T> = std::result::Result<T, GroveError>;
