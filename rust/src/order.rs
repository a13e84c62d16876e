//! Total orders over key values.
//!
//! Every search inside a node is expressed through an [`OrderRelation`]
//! rather than `Ord` directly, so one tree instance can index keys under a
//! caller-chosen order (reversed, by projection, collated, ...).

use std::marker::PhantomData;
use std::sync::Arc;

/// A consistent total order over `K`.
///
/// Implementations must be antisymmetric and transitive for the lifetime of
/// the tree that uses them.
pub trait OrderRelation<K: ?Sized> {
    /// Strict precedence: `a` sorts before `b`.
    fn lower(&self, a: &K, b: &K) -> bool;

    /// `a` sorts before `b` or in the same position.
    fn lower_or_equal(&self, a: &K, b: &K) -> bool {
        !self.lower(b, a)
    }
}

/// The key type's own `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> OrderRelation<K> for NaturalOrder {
    #[inline]
    fn lower(&self, a: &K, b: &K) -> bool {
        a < b
    }

    #[inline]
    fn lower_or_equal(&self, a: &K, b: &K) -> bool {
        a <= b
    }
}

/// Inverts another relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reverse<O>(pub O);

impl<K: ?Sized, O: OrderRelation<K>> OrderRelation<K> for Reverse<O> {
    fn lower(&self, a: &K, b: &K) -> bool {
        self.0.lower(b, a)
    }

    fn lower_or_equal(&self, a: &K, b: &K) -> bool {
        self.0.lower_or_equal(b, a)
    }
}

/// A relation backed by a strict "less than" closure.
pub struct OrderFn<K: ?Sized, F> {
    less: F,
    _marker: PhantomData<fn(&K)>,
}

impl<K: ?Sized, F> OrderFn<K, F>
where
    F: Fn(&K, &K) -> bool,
{
    pub fn new(less: F) -> Self {
        Self {
            less,
            _marker: PhantomData,
        }
    }
}

impl<K: ?Sized, F: Clone> Clone for OrderFn<K, F> {
    fn clone(&self) -> Self {
        Self {
            less: self.less.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K: ?Sized, F> std::fmt::Debug for OrderFn<K, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderFn").finish_non_exhaustive()
    }
}

impl<K: ?Sized, F> OrderRelation<K> for OrderFn<K, F>
where
    F: Fn(&K, &K) -> bool,
{
    fn lower(&self, a: &K, b: &K) -> bool {
        (self.less)(a, b)
    }
}

/// Lets all nodes of one tree share a single stateful relation.
impl<K: ?Sized, O: OrderRelation<K> + ?Sized> OrderRelation<K> for Arc<O> {
    fn lower(&self, a: &K, b: &K) -> bool {
        (**self).lower(a, b)
    }

    fn lower_or_equal(&self, a: &K, b: &K) -> bool {
        (**self).lower_or_equal(a, b)
    }
}
