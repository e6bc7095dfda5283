//! Key capabilities.
//!
//! Grove is generic over an opaque key type. Everything the engine ever
//! does with a key goes through a [`KeyOps`] implementation supplied once
//! at tree construction and fixed for the tree's lifetime:
//!
//! - [`KeyOps::cmp`] defines the one total order the tree uses, for
//!   placement, descent, and range bounds alike.
//! - [`KeyOps::clone_key`] produces the independent owned copy the tree
//!   stores. The tree never retains a reference into caller-supplied
//!   memory, which is why probe keys passed to `search`, `delete`, and
//!   `range_scan` may be partially populated scratch values: only the
//!   fields the comparator reads need to be meaningful.
//! - [`KeyOps::describe`] renders a key for diagnostics
//!   ([`crate::tree::BPlusTree::dump`]) and is never used for ordering.
//!
//! Releasing stored keys needs no capability of its own: the tree owns its
//! clones and drops them exactly when a key slot, a node, or the whole tree
//! goes away.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::marker::PhantomData;

/// The capability set that parametrises a tree over an opaque key type.
pub trait KeyOps<K> {
    /// Compare two keys under the tree's total order.
    ///
    /// Either argument may be a caller-owned probe; implementations must
    /// only read the fields that participate in the order.
    fn cmp(&self, a: &K, b: &K) -> Ordering;

    /// Produce an independent owned copy of `key`. Dropping the source must
    /// not affect the clone.
    fn clone_key(&self, key: &K) -> K;

    /// Render `key` for diagnostic output. Never used for ordering.
    fn describe(&self, _key: &K) -> String {
        "<key>".to_string()
    }
}

/// A [`KeyOps`] adapter for key types whose native `Ord` and `Clone` impls
/// already define the desired behaviour.
///
/// This is the capability set to reach for when the key is the whole record:
/// integers, strings, or any `#[derive(Ord, Clone)]` type.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOrd<K> {
    _marker: PhantomData<K>,
}

impl<K> NativeOrd<K> {
    pub fn new() -> Self {
        NativeOrd {
            _marker: PhantomData,
        }
    }
}

impl<K: Ord + Clone + Debug> KeyOps<K> for NativeOrd<K> {
    fn cmp(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }

    fn clone_key(&self, key: &K) -> K {
        key.clone()
    }

    fn describe(&self, key: &K) -> String {
        format!("{key:?}")
    }
}
