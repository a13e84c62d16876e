//! Borrowing one entry from an adjacent sibling.
//!
//! An underflowing node takes the nearest entry of a sibling that has keys
//! to spare: the sibling's rightmost entry when the sibling is on the left,
//! its leftmost entry when it is on the right. The parent separator between
//! the two nodes is then rewritten. Each variant supplies the entry movement
//! in its `redistribute`; the guards and separator lookup live here.
//!
//! Choosing between redistribution and merging, and which side to borrow
//! from, is left to the owning tree.

use crate::error::{NodeError, NodeResult};
use crate::node::BPlusNode;
use crate::types::{InternalNode, NodeId, SiblingSide};

/// Check the redistribution preconditions and return the index in
/// `parent.keys` of the separator between `node` and `sibling`.
pub(crate) fn separator_slot<N: BPlusNode>(
    node: &N,
    sibling: &N,
    parent: &InternalNode<N::Key, NodeId, N::Order>,
    side: SiblingSide,
) -> NodeResult<usize> {
    if node.has_minimum_keys() {
        return Err(NodeError::precondition(
            "separator lookup",
            &format!(
                "node {} holds {} keys, not below the minimum {}",
                node.id(),
                node.len(),
                node.fanout().min_keys()
            ),
        ));
    }
    if sibling.len() <= sibling.fanout().min_keys() {
        return Err(NodeError::precondition(
            "separator lookup",
            &format!(
                "sibling {} holds {} keys, no surplus over the minimum {}",
                sibling.id(),
                sibling.len(),
                sibling.fanout().min_keys()
            ),
        ));
    }

    let position = parent.position_of(&node.id()).ok_or_else(|| {
        NodeError::precondition(
            "separator lookup",
            &format!("node {} is not a child of {}", node.id(), parent.id()),
        )
    })?;
    let (sibling_position, slot) = match side {
        SiblingSide::Left => match position.checked_sub(1) {
            Some(left) => (left, left),
            None => {
                return Err(NodeError::precondition(
                    "separator lookup",
                    &format!("node {} is the leftmost child of {}", node.id(), parent.id()),
                ))
            }
        },
        SiblingSide::Right => (position + 1, position),
    };

    let adjacent = parent
        .pointers()
        .get(sibling_position)
        .and_then(Option::as_ref);
    if adjacent != Some(&sibling.id()) || slot >= parent.len() {
        return Err(NodeError::precondition(
            "separator lookup",
            &format!(
                "sibling {} is not the {:?} neighbour of {} under {}",
                sibling.id(),
                side,
                node.id(),
                parent.id()
            ),
        ));
    }
    Ok(slot)
}
