//! Change notification for node mutations.
//!
//! Every key insertion or removal on a node is reported, synchronously and
//! in mutation order, to the callbacks subscribed on that node. The channel
//! is observational only; nothing in the node logic reads it back.
//!
//! Callbacks must not mutate the emitting node.

use std::fmt;

use crate::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    InsertKey,
    DeleteKey,
    /// A separator rewritten in place during redistribution.
    ReplaceKey,
}

/// The key involved in a change. `index` is reported for insertions and
/// replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange<K> {
    pub value: K,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent<K, P> {
    pub kind: ChangeKind,
    pub node: NodeId,
    pub key: KeyChange<K>,
    /// The pointer stored alongside an inserted key.
    pub pointer: Option<P>,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<K, P> = Box<dyn FnMut(&ChangeEvent<K, P>)>;

pub struct ChangeChannel<K, P> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback<K, P>)>,
}

impl<K, P> ChangeChannel<K, P> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent<K, P>) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every subscriber in subscription order.
    ///
    /// The event is only built when someone is listening, so unobserved
    /// nodes never clone keys or pointers.
    pub fn emit_with<F>(&mut self, build: F)
    where
        F: FnOnce() -> ChangeEvent<K, P>,
    {
        if self.subscribers.is_empty() {
            return;
        }
        let event = build();
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }
}

impl<K, P> Default for ChangeChannel<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> fmt::Debug for ChangeChannel<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
