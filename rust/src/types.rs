//! Core types and data structures for B+ tree nodes.
//!
//! This module contains the node data model shared by both variants, the
//! identifiers nodes are addressed by, and the constants bounding fanout.

use serde::{Deserialize, Serialize};

use crate::change::ChangeChannel;
use crate::order::NaturalOrder;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Minimum fanout for any B+ tree node
pub const MIN_FANOUT: usize = 3;

/// Fanout used by `Default` constructors
pub const DEFAULT_FANOUT: usize = 16;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// Stable node identity handed out by the allocator that owns the node.
///
/// The generation distinguishes successive occupants of one arena slot, so
/// an id is never reissued once its node has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(&self) -> u32 {
        self.index
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A pointer slot. `None` marks an absent child while keeping the slot
/// aligned with its key.
pub type Pointer<P> = Option<P>;

/// Validated maximum number of pointers per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fanout(pub(crate) usize);

/// Which side of the receiving node a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiblingSide {
    Left,
    Right,
}

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// State shared by both node variants.
#[derive(Debug)]
pub struct NodeCore<K, P, O = NaturalOrder> {
    pub(crate) id: NodeId,
    pub(crate) fanout: Fanout,
    /// Keys in strictly ascending order under `order`.
    pub(crate) keys: Vec<K>,
    /// Records for a leaf (one per key), children for an internal node
    /// (one more than keys).
    pub(crate) pointers: Vec<Pointer<P>>,
    pub(crate) order: O,
    pub(crate) channel: ChangeChannel<K, P>,
}

/// Leaf node holding (key, record pointer) pairs.
#[derive(Debug, Clone)]
pub struct LeafNode<K, P, O = NaturalOrder> {
    pub(crate) core: NodeCore<K, P, O>,
}

/// Internal node holding separator keys and child pointers.
#[derive(Debug, Clone)]
pub struct InternalNode<K, C = NodeId, O = NaturalOrder> {
    pub(crate) core: NodeCore<K, C, O>,
}

/// Either variant, for owners that keep leaves and internal nodes in one
/// arena. Internal children are addressed by `NodeId`.
#[derive(Debug, Clone)]
pub enum Node<K, R, O = NaturalOrder> {
    Leaf(LeafNode<K, R, O>),
    Internal(InternalNode<K, NodeId, O>),
}

/// Externally visible structural dump of a node.
///
/// Child pointers are whatever reference the owning tree stores (typically
/// a `NodeId`); children are never embedded recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot<K, P> {
    pub id: NodeId,
    pub keys: Vec<K>,
    pub pointers: Vec<Pointer<P>>,
}
