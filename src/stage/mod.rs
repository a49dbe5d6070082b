//! Pipeline stages and the capability-probing protocol.
//!
//! Every stage implements [`Stage`], a four-probe contract that lets terminal
//! consumers negotiate the cheapest realization strategy. Probes are tried
//! cheapest first (count, contiguous view, bulk copy) before degrading to the
//! universal one-at-a-time pull. A consumer never re-issues
//! a cheaper probe after falling back, so a stage is never partially
//! re-enumerated.

pub mod combinator;
pub mod compare;
pub mod ordering;
pub mod source;

pub use combinator::{Filter, Map, Skip, Take};
pub use compare::{Comparer, IdentityLevel, KeyedLink, Natural};
pub use ordering::OrderBy;

use crate::consume;
use crate::error::Result;

// ============================================================================
// Stage Trait
// ============================================================================

/// One lazy step in a sequence pipeline.
///
/// A stage is a value-semantics descriptor: it owns its upstream stage by
/// value, is `Clone` whenever its configuration is, and holds no per-run
/// state until first pulled. Dropping a stage releases its whole upstream
/// chain exactly once.
///
/// # Probe contract
///
/// - [`try_next`](Stage::try_next) is the universal fallback and must be
///   correct in all cases.
/// - The other three probes are optimizations that may fail soft (`None` /
///   `Ok(false)`); a failed probe must leave no iteration state observable by
///   later [`try_next`](Stage::try_next) calls.
/// - [`try_copy_into`](Stage::try_copy_into) succeeds only when the
///   destination can hold the full result, and then writes exactly the
///   element count reported by [`try_count`](Stage::try_count).
pub trait Stage {
    /// The element type this stage yields.
    type Item;

    /// Probe 1: report the element count without enumerating, if knowable
    /// without side effects.
    ///
    /// Stages whose transform preserves count forward this upstream; stages
    /// whose count depends on filtering return `None`.
    fn try_count(&self) -> Option<usize>;

    /// Probe 2: expose all elements as one borrowed contiguous block, without
    /// copying, if the stage already holds them that way.
    fn try_as_slice(&mut self) -> Option<&[Self::Item]>;

    /// Probe 3: fill a caller-provided buffer with the full result in bulk.
    ///
    /// Returns `Ok(false)` when the stage cannot take this path (unknown
    /// count, destination too small, or upstream refusal). Errors from
    /// upstream production propagate.
    fn try_copy_into(&mut self, dest: &mut [Self::Item]) -> Result<bool>;

    /// Probe 4: pull the next element.
    ///
    /// Returns `Ok(None)` when the stage is exhausted. Collaborator failures
    /// (e.g. an overflowing reduction feeding a [`from_fn`](source::from_fn)
    /// source) propagate as errors.
    fn try_next(&mut self) -> Result<Option<Self::Item>>;
}

// ============================================================================
// Operator Surface
// ============================================================================

/// Pipeline operators and terminal consumers, available on every [`Stage`].
pub trait StageExt: Stage + Sized {
    /// Transform every element with `f`. Preserves count.
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        F: FnMut(Self::Item) -> U,
    {
        Map::new(self, f)
    }

    /// Keep only elements matching `predicate`.
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        P: FnMut(&Self::Item) -> bool,
    {
        Filter::new(self, predicate)
    }

    /// Yield at most `limit` elements.
    fn take(self, limit: usize) -> Take<Self> {
        Take::new(self, limit)
    }

    /// Discard the first `count` elements.
    fn skip(self, count: usize) -> Skip<Self> {
        Skip::new(self, count)
    }

    /// Sort elements by their natural order.
    ///
    /// This is the only constructor eligible for the direct in-place fast
    /// path: no key extraction, no index indirection.
    fn order(self) -> OrderBy<Self, IdentityLevel>
    where
        Self::Item: Ord + Clone + 'static,
    {
        OrderBy::new(self, IdentityLevel::ascending())
    }

    /// Sort elements by their natural order, descending. Stable: equal
    /// elements keep their original relative order.
    fn order_descending(self) -> OrderBy<Self, IdentityLevel>
    where
        Self::Item: Ord + Clone + 'static,
    {
        OrderBy::new(self, IdentityLevel::descending())
    }

    /// Sort whole elements with a custom comparer.
    ///
    /// Always takes the general keyed path, even if `comparer` happens to
    /// order identically to the natural order.
    fn order_with<C>(self, comparer: C) -> OrderBy<Self, KeyedLink<(), fn(&Self::Item) -> Self::Item, C>>
    where
        Self::Item: Clone + 'static,
        C: Comparer<Self::Item> + Clone + 'static,
    {
        let select: fn(&Self::Item) -> Self::Item = compare::clone_key;
        OrderBy::new(self, KeyedLink::root(select, comparer, false))
    }

    /// Sort whole elements with a custom comparer, descending.
    fn order_descending_with<C>(
        self,
        comparer: C,
    ) -> OrderBy<Self, KeyedLink<(), fn(&Self::Item) -> Self::Item, C>>
    where
        Self::Item: Clone + 'static,
        C: Comparer<Self::Item> + Clone + 'static,
    {
        let select: fn(&Self::Item) -> Self::Item = compare::clone_key;
        OrderBy::new(self, KeyedLink::root(select, comparer, true))
    }

    /// Sort elements by an extracted key, ascending.
    fn order_by<K, F>(self, select: F) -> OrderBy<Self, KeyedLink<(), F, Natural>>
    where
        F: Fn(&Self::Item) -> K + Clone,
        K: Ord + 'static,
        Self::Item: Clone,
    {
        OrderBy::new(self, KeyedLink::root(select, Natural, false))
    }

    /// Sort elements by an extracted key, descending.
    fn order_by_descending<K, F>(self, select: F) -> OrderBy<Self, KeyedLink<(), F, Natural>>
    where
        F: Fn(&Self::Item) -> K + Clone,
        K: Ord + 'static,
        Self::Item: Clone,
    {
        OrderBy::new(self, KeyedLink::root(select, Natural, true))
    }

    /// Sort elements by an extracted key with a custom comparer, ascending.
    fn order_by_with<K, F, C>(self, select: F, comparer: C) -> OrderBy<Self, KeyedLink<(), F, C>>
    where
        F: Fn(&Self::Item) -> K + Clone,
        C: Comparer<K> + Clone + 'static,
        K: 'static,
        Self::Item: Clone,
    {
        OrderBy::new(self, KeyedLink::root(select, comparer, false))
    }

    /// Sort elements by an extracted key with a custom comparer, descending.
    fn order_by_descending_with<K, F, C>(
        self,
        select: F,
        comparer: C,
    ) -> OrderBy<Self, KeyedLink<(), F, C>>
    where
        F: Fn(&Self::Item) -> K + Clone,
        C: Comparer<K> + Clone + 'static,
        K: 'static,
        Self::Item: Clone,
    {
        OrderBy::new(self, KeyedLink::root(select, comparer, true))
    }

    /// Materialize the pipeline into a `Vec`.
    fn to_vec(self) -> Result<Vec<Self::Item>>
    where
        Self::Item: Clone,
    {
        consume::to_vec(self)
    }

    /// Materialize the pipeline into a fixed-size boxed slice.
    fn to_boxed_slice(self) -> Result<Box<[Self::Item]>>
    where
        Self::Item: Clone,
    {
        consume::to_vec(self).map(Vec::into_boxed_slice)
    }

    /// Count the elements, using the count probe when available.
    fn count(self) -> Result<usize> {
        consume::count(self)
    }

    /// Copy the full result into `dest`, returning the number of elements
    /// written.
    ///
    /// Fails with [`Error::DestinationTooSmall`](crate::Error) when `dest`
    /// cannot hold the result; in the pull fallback the destination may have
    /// been partially filled, but no other caller state is touched.
    fn copy_into(self, dest: &mut [Self::Item]) -> Result<usize>
    where
        Self::Item: Clone,
    {
        consume::copy_into(self, dest)
    }
}

impl<S: Stage> StageExt for S {}
