//! Construction and initialization logic for nodes.
//!
//! Fanout is validated once, here; every node of a tree instance is built
//! with the same `Fanout` value and the same order relation.

use crate::change::ChangeChannel;
use crate::error::{NodeError, NodeResult};
use crate::order::NaturalOrder;
use crate::types::{Fanout, InternalNode, LeafNode, NodeCore, NodeId, DEFAULT_FANOUT, MIN_FANOUT};

impl Fanout {
    /// Validate a fanout (maximum pointers per node).
    ///
    /// # Examples
    ///
    /// ```
    /// use bplustree_node::Fanout;
    ///
    /// let fanout = Fanout::new(4).unwrap();
    /// assert_eq!(fanout.max_keys(), 3);
    /// assert_eq!(fanout.min_keys(), 2);
    /// assert!(Fanout::new(2).is_err());
    /// ```
    pub fn new(fanout: usize) -> NodeResult<Self> {
        if fanout < MIN_FANOUT {
            return Err(NodeError::invalid_fanout(fanout, MIN_FANOUT));
        }
        Ok(Self(fanout))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// Keys a node holds when full.
    pub fn max_keys(&self) -> usize {
        self.0 - 1
    }

    /// ceil((fanout - 1) / 2)
    pub fn min_keys(&self) -> usize {
        (self.0 - 1).div_ceil(2)
    }

    /// First key index moved to the right sibling by a split: ceil(fanout / 2).
    pub fn split_index(&self) -> usize {
        self.0.div_ceil(2)
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self(DEFAULT_FANOUT)
    }
}

impl TryFrom<usize> for Fanout {
    type Error = NodeError;

    fn try_from(value: usize) -> NodeResult<Self> {
        Self::new(value)
    }
}

impl<K, P, O> NodeCore<K, P, O> {
    pub(crate) fn new(id: NodeId, fanout: Fanout, order: O) -> Self {
        Self {
            id,
            fanout,
            keys: Vec::with_capacity(fanout.get()),
            pointers: Vec::with_capacity(fanout.get() + 1),
            order,
            channel: ChangeChannel::new(),
        }
    }
}

impl<K, P> LeafNode<K, P> {
    /// Creates an empty leaf ordered by the keys' own `Ord`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplustree_node::{BPlusNode, Fanout, LeafNode, NodeId};
    ///
    /// let leaf: LeafNode<i32, &str> = LeafNode::new(NodeId::new(0, 0), Fanout::new(4).unwrap());
    /// assert!(leaf.is_empty());
    /// ```
    pub fn new(id: NodeId, fanout: Fanout) -> Self {
        Self::with_order(id, fanout, NaturalOrder)
    }
}

impl<K, P, O> LeafNode<K, P, O> {
    /// Creates an empty leaf searched under `order`.
    pub fn with_order(id: NodeId, fanout: Fanout, order: O) -> Self {
        Self {
            core: NodeCore::new(id, fanout, order),
        }
    }

    /// An empty leaf with a fresh id, the same fanout and a copy of this
    /// node's order: the sibling a split expects.
    pub fn empty_sibling(&self, id: NodeId) -> Self
    where
        O: Clone,
    {
        Self::with_order(id, self.core.fanout, self.core.order.clone())
    }
}

impl<K, C> InternalNode<K, C> {
    /// Creates an empty internal node ordered by the keys' own `Ord`.
    pub fn new(id: NodeId, fanout: Fanout) -> Self {
        Self::with_order(id, fanout, NaturalOrder)
    }
}

impl<K, C, O> InternalNode<K, C, O> {
    /// Creates an empty internal node searched under `order`.
    pub fn with_order(id: NodeId, fanout: Fanout, order: O) -> Self {
        Self {
            core: NodeCore::new(id, fanout, order),
        }
    }

    /// A new root over two children: `[left] separator [right]`.
    pub fn with_children(
        id: NodeId,
        fanout: Fanout,
        order: O,
        left: C,
        separator: K,
        right: C,
    ) -> Self {
        let mut node = Self::with_order(id, fanout, order);
        node.core.keys.push(separator);
        node.core.pointers.push(Some(left));
        node.core.pointers.push(Some(right));
        node
    }

    pub fn empty_sibling(&self, id: NodeId) -> Self
    where
        O: Clone,
    {
        Self::with_order(id, self.core.fanout, self.core.order.clone())
    }
}
