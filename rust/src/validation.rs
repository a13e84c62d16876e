//! Invariant checking for nodes.
//!
//! `validate` covers what a node can check alone: strict key order, pointer
//! arity and capacity. Separator placement needs the children's keys, so
//! `validate_separators` takes a lookup from child id to keys.

use crate::error::{NodeError, NodeResult};
use crate::node::BPlusNode;
use crate::order::OrderRelation;
use crate::types::{InternalNode, LeafNode, NodeId};

/// Per-node invariant checks, implemented by both variants.
pub trait Validate {
    /// Returns true if ordering, arity and capacity invariants hold.
    fn check_invariants(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate(&self) -> NodeResult<()>;
}

fn check_order<N: BPlusNode>(node: &N) -> NodeResult<()> {
    let order = &node.core().order;
    if let Some(i) = node
        .keys()
        .windows(2)
        .position(|pair| !order.lower(&pair[0], &pair[1]))
    {
        return Err(NodeError::data_integrity(
            "key order",
            &format!("node {} keys at {} and {} are not ascending", node.id(), i, i + 1),
        ));
    }
    Ok(())
}

fn check_capacity<N: BPlusNode>(node: &N) -> NodeResult<()> {
    if node.is_overfull() {
        return Err(NodeError::data_integrity(
            "capacity",
            &format!(
                "node {} holds {} keys at fanout {}",
                node.id(),
                node.len(),
                node.fanout().get()
            ),
        ));
    }
    Ok(())
}

fn check_arity<N: BPlusNode>(node: &N, expected: usize) -> NodeResult<()> {
    if node.pointers().len() != expected {
        return Err(NodeError::data_integrity(
            "arity",
            &format!(
                "node {} has {} keys and {} pointers, expected {} pointers",
                node.id(),
                node.len(),
                node.pointers().len(),
                expected
            ),
        ));
    }
    Ok(())
}

impl<K, P, O> Validate for LeafNode<K, P, O>
where
    K: Clone + PartialEq,
    P: Clone,
    O: OrderRelation<K>,
{
    fn validate(&self) -> NodeResult<()> {
        check_order(self)?;
        check_arity(self, self.len())?;
        check_capacity(self)
    }
}

impl<K, C, O> Validate for InternalNode<K, C, O>
where
    K: Clone + PartialEq,
    C: Clone,
    O: OrderRelation<K>,
{
    /// An internal node with no keys and no pointers is a freshly built
    /// node not yet attached; anything else needs one more pointer than keys.
    fn validate(&self) -> NodeResult<()> {
        check_order(self)?;
        if !(self.is_empty() && self.pointers().is_empty()) {
            check_arity(self, self.len() + 1)?;
        }
        check_capacity(self)
    }
}

impl<K, O> InternalNode<K, NodeId, O>
where
    K: Clone + PartialEq,
    O: OrderRelation<K>,
{
    /// Check that every key in child `i` is below `keys[i]` and at or above
    /// `keys[i - 1]`. `lookup` returns a child's keys; absent children and
    /// children `lookup` cannot resolve are skipped.
    pub fn validate_separators<'a, F>(&self, lookup: F) -> NodeResult<()>
    where
        K: 'a,
        F: Fn(NodeId) -> Option<&'a [K]>,
    {
        let order = &self.core.order;
        let keys = self.keys();
        for (i, child) in self.pointers().iter().enumerate() {
            let Some(child_keys) = child.and_then(&lookup) else {
                continue;
            };
            for key in child_keys {
                if let Some(upper) = keys.get(i) {
                    if !order.lower(key, upper) {
                        return Err(NodeError::data_integrity(
                            "separator",
                            &format!(
                                "child {} of node {} holds a key not below separator {}",
                                i,
                                self.id(),
                                i
                            ),
                        ));
                    }
                }
                if let Some(lower) = i.checked_sub(1).and_then(|j| keys.get(j)) {
                    if order.lower(key, lower) {
                        return Err(NodeError::data_integrity(
                            "separator",
                            &format!(
                                "child {} of node {} holds a key below separator {}",
                                i,
                                self.id(),
                                i - 1
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::NaturalOrder;
    use crate::types::Fanout;
    use std::collections::HashMap;

    fn fanout() -> Fanout {
        Fanout::new(4).unwrap()
    }

    #[test]
    fn well_formed_nodes_validate() {
        let mut leaf: LeafNode<i32, ()> = LeafNode::new(NodeId::new(0, 0), fanout());
        leaf.insert(1, None).unwrap();
        leaf.insert(2, None).unwrap();
        assert!(leaf.check_invariants());

        let empty: InternalNode<i32> = InternalNode::new(NodeId::new(1, 0), fanout());
        assert!(empty.check_invariants());
    }

    #[test]
    fn detects_unsorted_keys_and_bad_arity() {
        let mut leaf: LeafNode<i32, ()> = LeafNode::new(NodeId::new(0, 0), fanout());
        leaf.core.keys = vec![2, 1];
        leaf.core.pointers = vec![None, None];
        assert!(matches!(leaf.validate(), Err(NodeError::DataIntegrity(_))));

        leaf.core.keys = vec![1, 2];
        leaf.core.pointers = vec![None];
        assert!(matches!(leaf.validate(), Err(NodeError::DataIntegrity(_))));

        let mut internal: InternalNode<i32> = InternalNode::new(NodeId::new(1, 0), fanout());
        internal.core.keys = vec![5];
        internal.core.pointers = vec![Some(NodeId::new(2, 0))];
        assert!(!internal.check_invariants());
    }

    #[test]
    fn overfull_node_fails_capacity() {
        let mut leaf: LeafNode<i32, ()> = LeafNode::new(NodeId::new(0, 0), fanout());
        for k in 0..4 {
            leaf.insert(k, None).unwrap();
        }
        assert!(leaf.validate().unwrap_err().to_string().contains("capacity"));
    }

    #[test]
    fn separators_bound_children() {
        let (a, b) = (NodeId::new(1, 0), NodeId::new(2, 0));
        let parent = InternalNode::with_children(NodeId::new(0, 0), fanout(), NaturalOrder, a, 10, b);
        let mut children: HashMap<NodeId, Vec<i32>> = HashMap::new();
        children.insert(a, vec![1, 5, 9]);
        children.insert(b, vec![10, 15]);
        assert_eq!(
            parent.validate_separators(|id| children.get(&id).map(Vec::as_slice)),
            Ok(())
        );

        children.insert(b, vec![9, 15]);
        assert!(parent
            .validate_separators(|id| children.get(&id).map(Vec::as_slice))
            .is_err());
    }
}
