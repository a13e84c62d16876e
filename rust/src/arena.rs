//! Slot arena that owns nodes and hands out their identities.
//!
//! Freed slots are reused, but each reuse bumps the slot's generation, so a
//! `NodeId` is never handed out twice and a stale id never reaches a newer
//! occupant. A slot whose generation is exhausted is retired, never reused.

use tracing::trace;

use crate::error::{NodeError, NodeResult};
use crate::types::NodeId;

/// Statistics for a node arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaStats {
    pub total_slots: usize,
    pub allocated_count: usize,
    pub free_count: usize,
    pub utilization: f64,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    /// Free slot indices for reuse
    free_list: Vec<usize>,
    /// Empty slots at `u32::MAX` generation, kept out of the free list
    retired: usize,
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            retired: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            retired: 0,
        }
    }

    /// Allocate a slot and build its occupant with the id it will live under.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplustree_node::{BPlusNode, Fanout, LeafNode, NodeArena};
    ///
    /// let mut arena = NodeArena::new();
    /// let fanout = Fanout::new(4).unwrap();
    /// let id = arena
    ///     .allocate_with(|id| LeafNode::<i32, &str>::new(id, fanout))
    ///     .unwrap();
    /// assert_eq!(arena.get(id).map(|leaf| leaf.id()), Some(id));
    /// ```
    pub fn allocate_with<F>(&mut self, build: F) -> NodeResult<NodeId>
    where
        F: FnOnce(NodeId) -> T,
    {
        let id = match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation += 1;
                NodeId::new(Self::slot_index(index)?, slot.generation)
            }
            None => {
                let index = self.slots.len();
                let id = NodeId::new(Self::slot_index(index)?, 0);
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                id
            }
        };
        self.slots[id.index as usize].value = Some(build(id));
        trace!(node = %id, "arena allocate");
        Ok(id)
    }

    fn slot_index(index: usize) -> NodeResult<u32> {
        u32::try_from(index).map_err(|_| {
            NodeError::precondition("arena allocate", "slot index does not fit in a NodeId")
        })
    }

    fn slot(&self, id: NodeId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Release a node, returning it. Stale or unknown ids return `None`.
    pub fn deallocate(&mut self, id: NodeId) -> Option<T> {
        let index = id.index as usize;
        let slot = self.slots.get_mut(index)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.release(index);
        trace!(node = %id, "arena deallocate");
        Some(value)
    }

    /// Return an emptied slot to the free list, or retire it when its
    /// generation cannot be bumped again.
    fn release(&mut self, index: usize) {
        if self.slots[index].generation == u32::MAX {
            self.retired += 1;
            trace!(slot = index, "arena retire slot");
        } else {
            self.free_list.push(index);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slot(id).and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Two distinct live nodes at once, e.g. a node and the sibling it
    /// splits into.
    pub fn get_pair_mut(&mut self, a: NodeId, b: NodeId) -> Option<(&mut T, &mut T)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (ia, ib) = (a.index as usize, b.index as usize);
        let (low, high) = (ia.min(ib), ia.max(ib));
        let (head, tail) = self.slots.split_at_mut(high);
        let low_value = head[low].value.as_mut()?;
        let high_value = tail[0].value.as_mut()?;
        if ia < ib {
            Some((low_value, high_value))
        } else {
            Some((high_value, low_value))
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len() - self.retired
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ArenaStats {
        let total_slots = self.slots.len();
        let allocated_count = self.len();
        let utilization = if total_slots > 0 {
            allocated_count as f64 / total_slots as f64
        } else {
            0.0
        };
        ArenaStats {
            total_slots,
            allocated_count,
            free_count: self.free_list.len(),
            utilization,
        }
    }

    /// Live nodes with their ids, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (NodeId::new(index as u32, slot.generation), value))
        })
    }

    /// Release every node. Generations are kept, so ids stay unique.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].value.take().is_some() {
                self.release(index);
            }
        }
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BPlusNode;
    use crate::types::{Fanout, LeafNode, Node};

    type Leaf = LeafNode<i32, u64>;

    fn fanout() -> Fanout {
        Fanout::new(4).unwrap()
    }

    #[test]
    fn ids_are_never_reissued() {
        let mut arena: NodeArena<Leaf> = NodeArena::new();
        let first = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();
        assert!(arena.deallocate(first).is_some());
        let second = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(arena.get(first).is_none());
        assert!(arena.deallocate(first).is_none());
        assert_eq!(arena.get(second).map(|leaf| leaf.id()), Some(second));
    }

    #[test]
    fn stats_track_free_slots() {
        let mut arena: NodeArena<Leaf> = NodeArena::with_capacity(4);
        let ids: Vec<NodeId> = (0..4)
            .map(|_| arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap())
            .collect();
        arena.deallocate(ids[1]);

        let stats = arena.stats();
        assert_eq!(stats.total_slots, 4);
        assert_eq!(stats.allocated_count, 3);
        assert_eq!(stats.free_count, 1);
        assert_eq!(stats.utilization, 0.75);
        assert_eq!(arena.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn pair_access_splits_arena_owned_leaf() {
        let mut arena: NodeArena<Leaf> = NodeArena::new();
        let left = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();
        let right = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();
        {
            let leaf = arena.get_mut(left).unwrap();
            for k in [10, 20, 25, 30] {
                leaf.insert(k, Some(k as u64)).unwrap();
            }
        }

        let (l, r) = arena.get_pair_mut(left, right).unwrap();
        assert_eq!(l.split(r), Ok(25));

        assert_eq!(arena.get(left).unwrap().keys(), &[10, 20]);
        assert_eq!(arena.get(right).unwrap().keys(), &[25, 30]);
        assert!(arena.get_pair_mut(left, left).is_none());
        let (r2, l2) = arena.get_pair_mut(right, left).unwrap();
        assert_eq!((r2.id(), l2.id()), (right, left));
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut arena: NodeArena<Leaf> = NodeArena::new();
        let first = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();
        arena.deallocate(first);
        arena.slots[0].generation = u32::MAX - 1;
        let last = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();
        assert_eq!(last.generation(), u32::MAX);

        assert!(arena.deallocate(last).is_some());
        let next = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();

        assert_ne!(next.index(), last.index());
        assert_eq!(next.generation(), 0);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.stats().free_count, 0);

        arena.slots[1].generation = u32::MAX;
        let exhausted = NodeId::new(1, u32::MAX);
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.get(exhausted).is_none());
        let reused = arena.allocate_with(|id| Leaf::new(id, fanout())).unwrap();
        assert_eq!(reused.index(), 2);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn mixed_variants_share_one_arena() {
        let mut arena: NodeArena<Node<i32, u64>> = NodeArena::new();
        let leaf = arena
            .allocate_with(|id| Node::Leaf(LeafNode::new(id, fanout())))
            .unwrap();
        let root = arena
            .allocate_with(|id| {
                Node::Internal(crate::types::InternalNode::with_children(
                    id,
                    fanout(),
                    crate::order::NaturalOrder,
                    leaf,
                    100,
                    leaf,
                ))
            })
            .unwrap();

        assert!(arena.get(leaf).unwrap().is_leaf());
        assert_eq!(arena.get(root).unwrap().keys(), &[100]);
        assert_eq!(arena.len(), 2);
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.get(leaf).is_none());
        let reused = arena
            .allocate_with(|id| Node::Leaf(LeafNode::new(id, fanout())))
            .unwrap();
        assert_ne!(reused, leaf);
        assert_ne!(reused, root);
    }
}
