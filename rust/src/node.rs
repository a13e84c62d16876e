//! Behavior shared by leaf and internal nodes.
//!
//! [`BPlusNode`] is the capability set an owning tree drives. The queries
//! are implemented once here on top of [`NodeCore`]; `insert`, `delete`,
//! `split` and `redistribute` are supplied by each variant.

use crate::change::{ChangeEvent, ChangeKind, KeyChange, SubscriptionId};
use crate::error::{NodeError, NodeResult};
use crate::order::OrderRelation;
use crate::types::{
    Fanout, InternalNode, LeafNode, Node, NodeCore, NodeId, NodeSnapshot, Pointer, SiblingSide,
};

// ============================================================================
// CAPABILITY SET
// ============================================================================

pub trait BPlusNode {
    type Key: Clone + PartialEq;
    type Pointer: Clone;
    type Order: OrderRelation<Self::Key>;

    fn core(&self) -> &NodeCore<Self::Key, Self::Pointer, Self::Order>;
    fn core_mut(&mut self) -> &mut NodeCore<Self::Key, Self::Pointer, Self::Order>;

    /// Insert a key and its pointer in key order, returning the key's index.
    fn insert(&mut self, key: Self::Key, pointer: Pointer<Self::Pointer>) -> NodeResult<usize>;

    /// Remove `key` and its paired pointer. Absent keys are a silent no-op
    /// and return `None`.
    fn delete(&mut self, key: &Self::Key) -> Option<(Self::Key, Pointer<Self::Pointer>)>;

    /// Move the upper half of this node into the empty `right` sibling and
    /// return the separator key the parent must receive.
    fn split(&mut self, right: &mut Self) -> NodeResult<Self::Key>
    where
        Self: Sized;

    /// Borrow one entry from an adjacent `sibling` with surplus keys and fix
    /// the separator between the two in `parent`.
    fn redistribute(
        &mut self,
        sibling: &mut Self,
        parent: &mut InternalNode<Self::Key, NodeId, Self::Order>,
        key: Self::Key,
        side: SiblingSide,
    ) -> NodeResult<()>
    where
        Self: Sized;

    // ========================================================================
    // SHARED QUERIES
    // ========================================================================

    fn id(&self) -> NodeId {
        self.core().id
    }

    fn fanout(&self) -> Fanout {
        self.core().fanout
    }

    fn keys(&self) -> &[Self::Key] {
        &self.core().keys
    }

    fn pointers(&self) -> &[Pointer<Self::Pointer>] {
        &self.core().pointers
    }

    /// Number of keys.
    fn len(&self) -> usize {
        self.core().keys.len()
    }

    fn is_empty(&self) -> bool {
        self.core().keys.is_empty()
    }

    fn most_left_key(&self) -> NodeResult<&Self::Key> {
        let core = self.core();
        core.keys.first().ok_or(NodeError::EmptyNode(core.id))
    }

    fn most_right_key(&self) -> NodeResult<&Self::Key> {
        let core = self.core();
        core.keys.last().ok_or(NodeError::EmptyNode(core.id))
    }

    /// The leftmost pointer slot; `Ok(None)` when that slot is an absent child.
    fn most_left_pointer(&self) -> NodeResult<Option<&Self::Pointer>> {
        let core = self.core();
        core.pointers
            .first()
            .map(Option::as_ref)
            .ok_or(NodeError::EmptyNode(core.id))
    }

    fn most_right_pointer(&self) -> NodeResult<Option<&Self::Pointer>> {
        let core = self.core();
        core.pointers
            .last()
            .map(Option::as_ref)
            .ok_or(NodeError::EmptyNode(core.id))
    }

    /// Exact membership, independent of the order relation.
    fn has_key(&self, key: &Self::Key) -> bool {
        self.core().keys.contains(key)
    }

    /// At capacity: `fanout - 1` keys.
    fn is_full(&self) -> bool {
        self.len() == self.fanout().max_keys()
    }

    /// Must be split before control returns to the tree.
    fn is_overfull(&self) -> bool {
        self.len() >= self.fanout().get()
    }

    fn has_minimum_keys(&self) -> bool {
        self.len() >= self.fanout().min_keys()
    }

    fn non_null_pointers(&self) -> impl Iterator<Item = &Self::Pointer> + '_ {
        self.core().pointers.iter().filter_map(Option::as_ref)
    }

    fn last_non_null_pointer(&self) -> Option<&Self::Pointer> {
        self.core().pointers.iter().rev().find_map(Option::as_ref)
    }

    fn snapshot(&self) -> NodeSnapshot<Self::Key, Self::Pointer> {
        let core = self.core();
        NodeSnapshot {
            id: core.id,
            keys: core.keys.clone(),
            pointers: core.pointers.clone(),
        }
    }

    fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent<Self::Key, Self::Pointer>) + 'static,
    {
        self.core_mut().channel.subscribe(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.core_mut().channel.unsubscribe(id)
    }
}

// ============================================================================
// CORE HELPERS
// ============================================================================

impl<K, P, O> NodeCore<K, P, O>
where
    K: Clone,
    P: Clone,
    O: OrderRelation<K>,
{
    /// First index `i` with `key <= keys[i]`.
    pub(crate) fn position_lower_or_equal(&self, key: &K) -> Option<usize> {
        self.keys
            .iter()
            .position(|k| self.order.lower_or_equal(key, k))
    }

    /// First index `i` with `key < keys[i]`.
    pub(crate) fn position_lower(&self, key: &K) -> Option<usize> {
        self.keys.iter().position(|k| self.order.lower(key, k))
    }

    /// Report the key now at `index` and the pointer stored with it at
    /// `pointer_index`.
    pub(crate) fn emit_insert(&mut self, index: usize, pointer_index: usize) {
        let node = self.id;
        let value = &self.keys[index];
        let pointer = &self.pointers[pointer_index];
        self.channel.emit_with(|| ChangeEvent {
            kind: ChangeKind::InsertKey,
            node,
            key: KeyChange {
                value: value.clone(),
                index: Some(index),
            },
            pointer: pointer.clone(),
        });
    }

    pub(crate) fn emit_delete(&mut self, value: &K) {
        let node = self.id;
        self.channel.emit_with(|| ChangeEvent {
            kind: ChangeKind::DeleteKey,
            node,
            key: KeyChange {
                value: value.clone(),
                index: None,
            },
            pointer: None,
        });
    }

    pub(crate) fn emit_replace(&mut self, index: usize) {
        let node = self.id;
        let value = &self.keys[index];
        self.channel.emit_with(|| ChangeEvent {
            kind: ChangeKind::ReplaceKey,
            node,
            key: KeyChange {
                value: value.clone(),
                index: Some(index),
            },
            pointer: None,
        });
    }
}

/// Shared guards for both variants' inserts.
pub(crate) fn check_insert<N: BPlusNode>(node: &N, key: &N::Key, operation: &str) -> NodeResult<()> {
    if node.is_overfull() {
        return Err(NodeError::precondition(
            operation,
            &format!(
                "node {} already holds {} keys (fanout {}); split it first",
                node.id(),
                node.len(),
                node.fanout().get()
            ),
        ));
    }
    if node.has_key(key) {
        return Err(NodeError::precondition(
            operation,
            &format!("node {} already holds this key", node.id()),
        ));
    }
    Ok(())
}

/// Shared guards for both variants' splits. Returns the first key index
/// that moves to the right sibling.
pub(crate) fn check_split<N: BPlusNode>(node: &N, right: &N, operation: &str) -> NodeResult<usize> {
    let fanout = node.fanout();
    let split_index = fanout.split_index();
    if node.len() < fanout.max_keys() || node.len() <= split_index {
        return Err(NodeError::precondition(
            operation,
            &format!(
                "node {} holds {} keys, too few to split at fanout {}",
                node.id(),
                node.len(),
                fanout.get()
            ),
        ));
    }
    if !right.is_empty() || !right.pointers().is_empty() {
        return Err(NodeError::precondition(
            operation,
            &format!("sibling {} is not empty", right.id()),
        ));
    }
    if right.fanout() != fanout {
        return Err(NodeError::precondition(
            operation,
            &format!(
                "sibling fanout {} differs from {}",
                right.fanout().get(),
                fanout.get()
            ),
        ));
    }
    if right.id() == node.id() {
        return Err(NodeError::precondition(
            operation,
            &format!("sibling shares id {}", node.id()),
        ));
    }
    Ok(split_index)
}

/// Structural copy: the clone shares nothing mutable with the original and
/// starts with no subscribers.
impl<K: Clone, P: Clone, O: Clone> Clone for NodeCore<K, P, O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fanout: self.fanout,
            keys: self.keys.clone(),
            pointers: self.pointers.clone(),
            order: self.order.clone(),
            channel: Default::default(),
        }
    }
}

// ============================================================================
// TAGGED UNION
// ============================================================================

macro_rules! dispatch {
    ($node:expr, $n:ident => $body:expr) => {
        match $node {
            Node::Leaf($n) => $body,
            Node::Internal($n) => $body,
        }
    };
}

/// Leaves and internal nodes take different pointer types, so `insert` and
/// `redistribute` are not dispatched here; reach them through
/// [`Node::as_leaf_mut`] or [`Node::as_internal_mut`].
impl<K, R, O> Node<K, R, O>
where
    K: Clone + PartialEq,
    R: Clone,
    O: OrderRelation<K>,
{
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn id(&self) -> NodeId {
        dispatch!(self, n => n.id())
    }

    pub fn fanout(&self) -> Fanout {
        dispatch!(self, n => n.fanout())
    }

    pub fn keys(&self) -> &[K] {
        dispatch!(self, n => n.keys())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, n => n.len())
    }

    pub fn is_empty(&self) -> bool {
        dispatch!(self, n => n.is_empty())
    }

    pub fn most_left_key(&self) -> NodeResult<&K> {
        dispatch!(self, n => n.most_left_key())
    }

    pub fn most_right_key(&self) -> NodeResult<&K> {
        dispatch!(self, n => n.most_right_key())
    }

    pub fn has_key(&self, key: &K) -> bool {
        dispatch!(self, n => n.has_key(key))
    }

    pub fn is_full(&self) -> bool {
        dispatch!(self, n => n.is_full())
    }

    pub fn is_overfull(&self) -> bool {
        dispatch!(self, n => n.is_overfull())
    }

    pub fn has_minimum_keys(&self) -> bool {
        dispatch!(self, n => n.has_minimum_keys())
    }

    /// Variant-appropriate delete; returns whether a key was removed.
    pub fn delete(&mut self, key: &K) -> bool {
        dispatch!(self, n => n.delete(key).is_some())
    }

    /// Split into `right`, which must be an empty node of the same variant.
    pub fn split(&mut self, right: &mut Self) -> NodeResult<K> {
        match (self, right) {
            (Node::Leaf(left), Node::Leaf(right)) => left.split(right),
            (Node::Internal(left), Node::Internal(right)) => left.split(right),
            (left, right) => Err(NodeError::precondition(
                "node split",
                &format!(
                    "{} and sibling {} are different node variants",
                    left.id(),
                    right.id()
                ),
            )),
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode<K, R, O>> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode<K, R, O>> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    pub fn as_internal(&self) -> Option<&InternalNode<K, NodeId, O>> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_internal_mut(&mut self) -> Option<&mut InternalNode<K, NodeId, O>> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::Leaf(_) => None,
        }
    }
}

impl<K, R, O> From<LeafNode<K, R, O>> for Node<K, R, O> {
    fn from(leaf: LeafNode<K, R, O>) -> Self {
        Node::Leaf(leaf)
    }
}

impl<K, R, O> From<InternalNode<K, NodeId, O>> for Node<K, R, O> {
    fn from(internal: InternalNode<K, NodeId, O>) -> Self {
        Node::Internal(internal)
    }
}
