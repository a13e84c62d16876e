//! Node-level mechanics of a B+ tree index.
//!
//! This crate provides the two node variants of a B+ tree (leaves holding
//! record pointers, internal nodes holding separators and children) with
//! ordered insertion, deletion, splitting and sibling redistribution. The
//! owning tree decides when to split or rebalance; the nodes carry out the
//! structural change and report each key movement to subscribers.
//!
//! # Examples
//!
//! ```
//! use bplustree_node::{BPlusNode, Fanout, LeafNode, NodeArena};
//!
//! let fanout = Fanout::new(4).unwrap();
//! let mut arena = NodeArena::new();
//! let left = arena.allocate_with(|id| LeafNode::new(id, fanout)).unwrap();
//! let right = arena.allocate_with(|id| LeafNode::new(id, fanout)).unwrap();
//!
//! let leaf = arena.get_mut(left).unwrap();
//! for key in [10, 20, 30, 25] {
//!     leaf.insert(key, Some(format!("r{}", key))).unwrap();
//! }
//! assert!(leaf.is_overfull());
//!
//! let (leaf, sibling) = arena.get_pair_mut(left, right).unwrap();
//! let separator = leaf.split(sibling).unwrap();
//! assert_eq!(separator, 25);
//! assert_eq!(leaf.keys(), &[10, 20]);
//! assert_eq!(sibling.keys(), &[25, 30]);
//! ```

mod arena;
mod change;
mod construction;
mod error;
mod internal_node;
mod leaf_node;
mod node;
mod order;
mod redistribute;
mod types;
mod validation;

pub use arena::{ArenaStats, NodeArena};
pub use change::{ChangeChannel, ChangeEvent, ChangeKind, KeyChange, SubscriptionId};
pub use error::{NodeError, NodeResult, NodeResultExt};
pub use node::BPlusNode;
pub use order::{NaturalOrder, OrderFn, OrderRelation, Reverse};
pub use types::{
    Fanout, InternalNode, LeafNode, Node, NodeCore, NodeId, NodeSnapshot, Pointer, SiblingSide,
    DEFAULT_FANOUT, MIN_FANOUT,
};
pub use validation::Validate;
