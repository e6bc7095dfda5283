//! # Grove
//!
//! A generic in-memory B+ tree index engine with ordered range scans.
//!
//! Grove stores opaque keys it only ever touches through a caller-supplied
//! capability set ([`KeyOps`]): a comparator defining the total order and a
//! clone operation producing the owned copies the tree stores. Data lives
//! exclusively in leaf nodes, which form an ascending doubly linked chain,
//! so range scans are a single descent plus a forward walk.
//!
//! ```
//! use grove::{BPlusTree, NativeOrd};
//!
//! let mut tree = BPlusTree::new(NativeOrd::<i32>::new());
//! for n in [5, 3, 8, 1, 9] {
//!     tree.insert(&n);
//! }
//! assert_eq!(tree.search(&8), Some(&8));
//! assert!(tree.delete(&8));
//! assert_eq!(tree.search(&8), None);
//!
//! let mut in_range = Vec::new();
//! tree.range_scan(&3, &9, |k| in_range.push(*k));
//! assert_eq!(in_range, vec![3, 5, 9]);
//! ```
//!
//! The engine permits duplicate keys; callers wanting set semantics search
//! before inserting. It is single-threaded and purely in-memory, with no
//! locking and no persistence.

pub mod error;
pub mod key;
pub mod node;
pub mod tree;

pub use error::{GroveError, Result};
pub use key::{KeyOps, NativeOrd};
pub use tree::BPlusTree;
