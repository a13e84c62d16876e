//! Internal node algorithms: separator keys with one more child than keys.
//!
//! `pointers[i]` holds keys below `keys[i]`; `pointers[i + 1]` holds keys at
//! or above it.

use tracing::{debug, trace};

use crate::error::{NodeError, NodeResult, NodeResultExt};
use crate::node::{check_insert, check_split, BPlusNode};
use crate::order::OrderRelation;
use crate::redistribute::separator_slot;
use crate::types::{InternalNode, NodeCore, NodeId, Pointer, SiblingSide};

impl<K, C, O> BPlusNode for InternalNode<K, C, O>
where
    K: Clone + PartialEq,
    C: Clone,
    O: OrderRelation<K>,
{
    type Key = K;
    type Pointer = C;
    type Order = O;

    fn core(&self) -> &NodeCore<K, C, O> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<K, C, O> {
        &mut self.core
    }

    /// The separator goes before the first strictly greater key and its
    /// child directly to its right. A key at or above every separator is
    /// appended together with its child.
    fn insert(&mut self, key: K, pointer: Pointer<C>) -> NodeResult<usize> {
        check_insert(self, &key, "internal insert")?;

        let core = &mut self.core;
        let (index, pointer_index) = match core.position_lower(&key) {
            Some(index) => {
                core.keys.insert(index, key);
                core.pointers.insert(index + 1, pointer);
                (index, index + 1)
            }
            None => {
                core.keys.push(key);
                core.pointers.push(pointer);
                (core.keys.len() - 1, core.pointers.len() - 1)
            }
        };
        trace!(node = %core.id, index, "internal insert");
        core.emit_insert(index, pointer_index);
        Ok(index)
    }

    /// Removes the separator and the child to its right; the left child
    /// survives. The dropped child is handed back so the owner can reclaim
    /// it; its subtree is expected to be empty or merged already.
    fn delete(&mut self, key: &K) -> Option<(K, Pointer<C>)> {
        let core = &mut self.core;
        let index = core.position_lower_or_equal(key)?;
        if core.keys[index] != *key {
            return None;
        }
        let removed = core.keys.remove(index);
        let pointer = if index + 1 < core.pointers.len() {
            core.pointers.remove(index + 1)
        } else {
            None
        };
        trace!(node = %core.id, index, "internal delete");
        core.emit_delete(&removed);
        Some((removed, pointer))
    }

    /// Keys from `ceil(fanout / 2)` onward move right, each with the child
    /// to its right, one at a time. The first moved key is then stripped
    /// from `right` and returned for the parent; its child stays behind as
    /// `right`'s leftmost pointer, so the median lives in neither half.
    fn split(&mut self, right: &mut Self) -> NodeResult<K> {
        let split_index = check_split(self, right, "internal split")?;

        let moving: Vec<K> = self.core.keys[split_index..].to_vec();
        for key in &moving {
            if let Some((key, pointer)) = self.delete(key) {
                right.insert(key, pointer).with_operation("internal split")?;
            }
        }
        let promoted = right.strip_first_key()?;

        debug!(
            node = %self.core.id,
            right = %right.core.id,
            moved = moving.len(),
            "internal split"
        );
        Ok(promoted)
    }

    /// Rotation through the parent: `key` (the separator between the two
    /// nodes) comes down into this node with the borrowed child, and the
    /// key the sibling gives up replaces it in `parent`. Any other `key` is
    /// rejected before either node changes.
    fn redistribute(
        &mut self,
        sibling: &mut Self,
        parent: &mut InternalNode<K, NodeId, O>,
        key: K,
        side: SiblingSide,
    ) -> NodeResult<()> {
        const OPERATION: &str = "internal redistribute";
        let slot = separator_slot(self, sibling, parent, side).with_operation(OPERATION)?;
        if parent.keys().get(slot) != Some(&key) {
            return Err(NodeError::precondition(
                OPERATION,
                &format!(
                    "key is not the separator at {} of {} between {} and {}",
                    slot,
                    parent.id(),
                    self.core.id,
                    sibling.core.id
                ),
            ));
        }
        if self.has_key(&key) {
            return Err(NodeError::precondition(
                OPERATION,
                &format!("node {} already holds the borrowed key", self.core.id),
            ));
        }

        let (donor_key, pointer) = match side {
            SiblingSide::Left => {
                let last = sibling.most_right_key()?.clone();
                sibling.delete(&last).ok_or_else(|| {
                    NodeError::data_integrity(OPERATION, "donor key vanished from sibling")
                })?
            }
            SiblingSide::Right => sibling.take_front()?,
        };
        match side {
            SiblingSide::Left => self.push_front(key, pointer),
            SiblingSide::Right => self.push_back(key, pointer),
        }
        parent.replace_key(slot, donor_key)?;

        debug!(
            node = %self.core.id,
            sibling = %sibling.core.id,
            ?side,
            slot,
            "internal redistribute"
        );
        Ok(())
    }
}

impl<K, C, O> InternalNode<K, C, O>
where
    K: Clone + PartialEq,
    C: Clone,
    O: OrderRelation<K>,
{
    /// Index of the child to descend into for `key`: the first separator
    /// strictly greater than it, or the last child.
    pub fn child_index(&self, key: &K) -> usize {
        self.core
            .position_lower(key)
            .unwrap_or(self.core.keys.len())
    }

    pub fn child_for(&self, key: &K) -> Option<&C> {
        self.core
            .pointers
            .get(self.child_index(key))
            .and_then(Option::as_ref)
    }

    /// Position of `child` among this node's pointers.
    pub fn position_of(&self, child: &C) -> Option<usize>
    where
        C: PartialEq,
    {
        self.core
            .pointers
            .iter()
            .position(|p| p.as_ref() == Some(child))
    }

    /// Overwrite the separator at `index`, returning the old one.
    pub fn replace_key(&mut self, index: usize, key: K) -> NodeResult<K> {
        let core = &mut self.core;
        let id = core.id;
        let slot = core.keys.get_mut(index).ok_or_else(|| {
            NodeError::precondition(
                "replace key",
                &format!("node {} has no separator at {}", id, index),
            )
        })?;
        let old = std::mem::replace(slot, key);
        trace!(node = %core.id, index, "replace separator");
        core.emit_replace(index);
        Ok(old)
    }

    /// Drop the leftmost key but keep every pointer.
    fn strip_first_key(&mut self) -> NodeResult<K> {
        let core = &mut self.core;
        if core.keys.is_empty() {
            return Err(NodeError::EmptyNode(core.id));
        }
        let key = core.keys.remove(0);
        core.emit_delete(&key);
        Ok(key)
    }

    /// Remove the leftmost key together with the leftmost child.
    fn take_front(&mut self) -> NodeResult<(K, Pointer<C>)> {
        let core = &mut self.core;
        if core.keys.is_empty() || core.pointers.is_empty() {
            return Err(NodeError::EmptyNode(core.id));
        }
        let key = core.keys.remove(0);
        let pointer = core.pointers.remove(0);
        trace!(node = %core.id, "internal take front");
        core.emit_delete(&key);
        Ok((key, pointer))
    }

    fn push_front(&mut self, key: K, pointer: Pointer<C>) {
        let core = &mut self.core;
        core.keys.insert(0, key);
        core.pointers.insert(0, pointer);
        core.emit_insert(0, 0);
    }

    fn push_back(&mut self, key: K, pointer: Pointer<C>) {
        let core = &mut self.core;
        core.keys.push(key);
        core.pointers.push(pointer);
        core.emit_insert(core.keys.len() - 1, core.pointers.len() - 1);
    }
}
