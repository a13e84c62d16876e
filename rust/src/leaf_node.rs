//! Leaf node algorithms: one record pointer per key.

use tracing::{debug, trace};

use crate::error::{NodeError, NodeResult, NodeResultExt};
use crate::node::{check_insert, check_split, BPlusNode};
use crate::order::OrderRelation;
use crate::redistribute::separator_slot;
use crate::types::{InternalNode, LeafNode, NodeCore, NodeId, Pointer, SiblingSide};

impl<K, P, O> BPlusNode for LeafNode<K, P, O>
where
    K: Clone + PartialEq,
    P: Clone,
    O: OrderRelation<K>,
{
    type Key = K;
    type Pointer = P;
    type Order = O;

    fn core(&self) -> &NodeCore<K, P, O> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore<K, P, O> {
        &mut self.core
    }

    /// The key lands before the first stored key it does not exceed, and
    /// its record at the same index.
    fn insert(&mut self, key: K, pointer: Pointer<P>) -> NodeResult<usize> {
        check_insert(self, &key, "leaf insert")?;

        let core = &mut self.core;
        let index = core
            .position_lower_or_equal(&key)
            .unwrap_or(core.keys.len());
        core.keys.insert(index, key);
        core.pointers.insert(index, pointer);
        trace!(node = %core.id, index, "leaf insert");
        core.emit_insert(index, index);
        Ok(index)
    }

    fn delete(&mut self, key: &K) -> Option<(K, Pointer<P>)> {
        let core = &mut self.core;
        let index = core.position_lower_or_equal(key)?;
        if core.keys[index] != *key {
            return None;
        }
        let removed = core.keys.remove(index);
        let pointer = core.pointers.remove(index);
        trace!(node = %core.id, index, "leaf delete");
        core.emit_delete(&removed);
        Some((removed, pointer))
    }

    /// Entries from index `ceil(fanout / 2)` onward move to `right` one at
    /// a time, so observers see each key leave and arrive. Returns a copy of
    /// `right`'s leftmost key; unlike an internal split it stays in the leaf.
    fn split(&mut self, right: &mut Self) -> NodeResult<K> {
        let split_index = check_split(self, right, "leaf split")?;

        let moving: Vec<K> = self.core.keys[split_index..].to_vec();
        for key in &moving {
            if let Some((key, pointer)) = self.delete(key) {
                right.insert(key, pointer).with_operation("leaf split")?;
            }
        }

        debug!(
            node = %self.core.id,
            right = %right.core.id,
            moved = moving.len(),
            "leaf split"
        );
        right.most_left_key().cloned()
    }

    /// The borrowed record is filed under `key`, which the caller chooses
    /// (normally the donor's key). The parent separator between the two
    /// leaves becomes the leftmost key of whichever of them is on the right.
    fn redistribute(
        &mut self,
        sibling: &mut Self,
        parent: &mut InternalNode<K, NodeId, O>,
        key: K,
        side: SiblingSide,
    ) -> NodeResult<()> {
        const OPERATION: &str = "leaf redistribute";
        let slot = separator_slot(self, sibling, parent, side).with_operation(OPERATION)?;
        if self.has_key(&key) {
            return Err(NodeError::precondition(
                OPERATION,
                &format!("node {} already holds the borrowed key", self.core.id),
            ));
        }

        let donor_key = match side {
            SiblingSide::Left => sibling.most_right_key()?,
            SiblingSide::Right => sibling.most_left_key()?,
        }
        .clone();
        let (_, pointer) = sibling.delete(&donor_key).ok_or_else(|| {
            NodeError::data_integrity(OPERATION, "donor key vanished from sibling")
        })?;
        self.insert(key, pointer).with_operation(OPERATION)?;

        let separator = match side {
            SiblingSide::Left => self.most_left_key()?,
            SiblingSide::Right => sibling.most_left_key()?,
        }
        .clone();
        parent.replace_key(slot, separator)?;

        debug!(
            node = %self.core.id,
            sibling = %sibling.core.id,
            ?side,
            slot,
            "leaf redistribute"
        );
        Ok(())
    }
}

impl<K, P, O> LeafNode<K, P, O>
where
    K: Clone + PartialEq,
    P: Clone,
    O: OrderRelation<K>,
{
    /// Record stored under `key`, if any. `Some(None)` means the key is
    /// present with an absent record.
    pub fn get(&self, key: &K) -> Option<Option<&P>> {
        let index = self.core.position_lower_or_equal(key)?;
        if self.core.keys[index] != *key {
            return None;
        }
        self.core.pointers.get(index).map(Option::as_ref)
    }

    /// Iterate over `(key, record)` pairs in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, Option<&P>)> + '_ {
        self.core
            .keys
            .iter()
            .zip(self.core.pointers.iter().map(Option::as_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeEvent, ChangeKind};
    use crate::order::{NaturalOrder, Reverse};
    use crate::types::Fanout;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn leaf_with(fanout: usize, keys: &[i32]) -> LeafNode<i32, String> {
        let mut leaf = LeafNode::new(NodeId::new(0, 0), Fanout::new(fanout).unwrap());
        for &k in keys {
            leaf.insert(k, Some(format!("r{}", k))).unwrap();
        }
        leaf
    }

    fn record_events(leaf: &mut LeafNode<i32, String>) -> Rc<RefCell<Vec<ChangeEvent<i32, String>>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        leaf.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn insert_keeps_keys_sorted_and_pointers_aligned() {
        let leaf = leaf_with(8, &[30, 10, 20, 5]);
        assert_eq!(leaf.keys(), &[5, 10, 20, 30]);
        assert_eq!(leaf.get(&20), Some(Some(&"r20".to_string())));
        assert_eq!(leaf.get(&21), None);
        assert_eq!(leaf.pointers().len(), leaf.keys().len());
    }

    #[test]
    fn insert_reports_index_and_emits_event() {
        let mut leaf = leaf_with(4, &[10, 30]);
        let events = record_events(&mut leaf);

        assert_eq!(leaf.insert(20, Some("r20".into())), Ok(1));

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::InsertKey);
        assert_eq!(events[0].node, leaf.id());
        assert_eq!(events[0].key.value, 20);
        assert_eq!(events[0].key.index, Some(1));
        assert_eq!(events[0].pointer, Some("r20".to_string()));
    }

    #[test]
    fn insert_rejects_duplicates_and_overfull() {
        let mut leaf = leaf_with(4, &[1, 2, 3]);
        assert!(leaf.insert(2, None).unwrap_err().is_precondition_violation());
        leaf.insert(4, None).unwrap();
        assert!(leaf.is_overfull());
        assert!(leaf.insert(5, None).unwrap_err().is_precondition_violation());
    }

    #[test]
    fn delete_absent_key_is_silent() {
        let mut leaf = leaf_with(4, &[10, 20]);
        let events = record_events(&mut leaf);
        let before = leaf.snapshot();

        assert_eq!(leaf.delete(&15), None);
        assert_eq!(leaf.delete(&99), None);

        assert_eq!(leaf.snapshot(), before);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn delete_removes_key_and_record() {
        let mut leaf = leaf_with(4, &[10, 20, 30]);
        let events = record_events(&mut leaf);

        assert_eq!(leaf.delete(&20), Some((20, Some("r20".to_string()))));

        assert_eq!(leaf.keys(), &[10, 30]);
        assert_eq!(leaf.pointers(), &[Some("r10".to_string()), Some("r30".to_string())]);
        let events = events.borrow();
        assert_eq!(events[0].kind, ChangeKind::DeleteKey);
        assert_eq!(events[0].key.value, 20);
        assert_eq!(events[0].key.index, None);
    }

    #[test]
    fn split_moves_upper_half_entry_by_entry() {
        let mut leaf = leaf_with(4, &[10, 20, 25, 30]);
        let mut right = leaf.empty_sibling(NodeId::new(1, 0));
        let left_events = record_events(&mut leaf);
        let right_events = record_events(&mut right);

        assert_eq!(leaf.split(&mut right), Ok(25));

        assert_eq!(leaf.keys(), &[10, 20]);
        assert_eq!(right.keys(), &[25, 30]);
        assert_eq!(right.pointers(), &[Some("r25".to_string()), Some("r30".to_string())]);
        let deleted: Vec<i32> = left_events.borrow().iter().map(|e| e.key.value).collect();
        let inserted: Vec<i32> = right_events.borrow().iter().map(|e| e.key.value).collect();
        assert_eq!(deleted, vec![25, 30]);
        assert_eq!(inserted, vec![25, 30]);
    }

    #[test]
    fn split_of_full_odd_fanout_leaf() {
        let mut leaf = leaf_with(5, &[1, 2, 3, 4]);
        let mut right = leaf.empty_sibling(NodeId::new(1, 0));
        assert_eq!(leaf.split(&mut right), Ok(4));
        assert_eq!(leaf.keys(), &[1, 2, 3]);
        assert_eq!(right.keys(), &[4]);
    }

    #[test]
    fn split_preconditions() {
        let mut leaf = leaf_with(4, &[1, 2]);
        let mut right = leaf.empty_sibling(NodeId::new(1, 0));
        assert!(leaf.split(&mut right).unwrap_err().is_precondition_violation());

        leaf.insert(3, None).unwrap();
        let mut occupied = leaf_with(4, &[9]);
        assert!(leaf.split(&mut occupied).unwrap_err().is_precondition_violation());

        let mut wider = LeafNode::new(NodeId::new(2, 0), Fanout::new(6).unwrap());
        assert!(leaf.split(&mut wider).unwrap_err().is_precondition_violation());
        assert_eq!(leaf.keys(), &[1, 2, 3]);
    }

    #[test]
    fn injected_order_controls_placement() {
        let fanout = Fanout::new(8).unwrap();
        let mut leaf: LeafNode<i32, (), Reverse<NaturalOrder>> =
            LeafNode::with_order(NodeId::new(0, 0), fanout, Reverse(NaturalOrder));
        for k in [1, 3, 2] {
            leaf.insert(k, None).unwrap();
        }
        assert_eq!(leaf.keys(), &[3, 2, 1]);
        assert_eq!(leaf.delete(&2), Some((2, None)));
        assert_eq!(leaf.keys(), &[3, 1]);
    }

    #[test]
    fn entries_pair_keys_with_records() {
        let leaf = leaf_with(4, &[2, 1]);
        let entries: Vec<(i32, Option<String>)> =
            leaf.entries().map(|(k, r)| (*k, r.cloned())).collect();
        assert_eq!(
            entries,
            vec![(1, Some("r1".to_string())), (2, Some("r2".to_string()))]
        );
    }
}
