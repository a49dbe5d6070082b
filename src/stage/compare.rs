//! Multi-key comparison chains for the ordering stage.
//!
//! An ordering expression is described by a typed chain of key levels,
//! primary level outermost. At sort time the chain is flattened bottom-up
//! into a list of type-erased comparison steps, each holding the key array it
//! extracted for this invocation. Comparing two positions walks the steps
//! front to back, stopping at the first non-equal level; a full tie falls
//! through to the original indices, which guarantees a stable total order.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::scratch;

// ============================================================================
// Comparers
// ============================================================================

/// Per-key comparison strategy.
///
/// Implemented by [`Natural`] for any `Ord` key and by any
/// `Fn(&K, &K) -> Ordering` closure for custom orders.
pub trait Comparer<K> {
    /// Compare two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The natural (`Ord`) comparer. This is the default for every ordering
/// operator that does not take an explicit comparer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Natural;

impl<K: Ord> Comparer<K> for Natural {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K, F> Comparer<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Identity key selector used by whole-element ordering with a custom
/// comparer.
pub(crate) fn clone_key<T: Clone>(item: &T) -> T {
    item.clone()
}

// ============================================================================
// Comparison Steps
// ============================================================================

/// One flattened level of a comparer chain: compares two positions through
/// the key array extracted for this sort invocation.
pub trait KeyStep {
    /// Compare the keys extracted for positions `i` and `j`.
    fn compare(&self, i: usize, j: usize) -> Ordering;
}

/// Flattened chain: one step per ordering level, primary level first.
///
/// Chains rarely exceed two levels, so the list lives inline.
pub type Steps = SmallVec<[Box<dyn KeyStep>; 2]>;

struct TypedStep<K, C> {
    keys: Vec<K>,
    comparer: C,
    descending: bool,
}

impl<K, C: Comparer<K>> KeyStep for TypedStep<K, C> {
    fn compare(&self, i: usize, j: usize) -> Ordering {
        let ord = self.comparer.compare(&self.keys[i], &self.keys[j]);
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Per-invocation comparator over a flattened chain.
pub(crate) struct ChainComparer {
    steps: Steps,
}

impl ChainComparer {
    pub(crate) fn new(steps: Steps) -> Self {
        Self { steps }
    }

    /// Compare two positions: first non-equal level wins; a full tie falls
    /// through to the original indices, always lowest-first regardless of any
    /// level's direction. That final rule is what makes the sort stable, and
    /// it also makes this a total order over distinct indices.
    pub(crate) fn compare(&self, i: usize, j: usize) -> Ordering {
        for step in &self.steps {
            let ord = step.compare(i, j);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        i.cmp(&j)
    }
}

// ============================================================================
// Chain Descriptors
// ============================================================================

/// A typed description of every ordering level of a sort expression.
///
/// Implemented by `()` (the empty root), [`IdentityLevel`], and
/// [`KeyedLink`]. Descriptors are value-semantics and cheap to clone; keys
/// are only extracted when a sort invocation flattens the chain.
pub trait KeyChain<T>: Clone {
    /// Number of ordering levels in this chain.
    fn levels(&self) -> usize;

    /// Sort `items` in place when this chain is the bare natural order.
    ///
    /// Returns `false` without touching `items` when the chain needs the
    /// general keyed path.
    fn try_sort_direct(&self, items: &mut [T]) -> bool;

    /// Extract this chain's keys for `items` and append one comparison step
    /// per level, primary level first.
    fn push_steps(&self, items: &[T], steps: &mut Steps);
}

impl<T> KeyChain<T> for () {
    fn levels(&self) -> usize {
        0
    }

    fn try_sort_direct(&self, _items: &mut [T]) -> bool {
        false
    }

    fn push_steps(&self, _items: &[T], _steps: &mut Steps) {}
}

/// A single natural-order level over whole elements, produced by
/// [`order`](crate::stage::StageExt::order) and
/// [`order_descending`](crate::stage::StageExt::order_descending).
///
/// On its own this level sorts directly in place. As the parent of a
/// `then_by` chain it degrades to an ordinary keyed level whose keys are
/// element clones.
#[derive(Clone, Copy, Debug)]
pub struct IdentityLevel {
    descending: bool,
}

impl IdentityLevel {
    pub(crate) fn ascending() -> Self {
        Self { descending: false }
    }

    pub(crate) fn descending() -> Self {
        Self { descending: true }
    }
}

impl<T> KeyChain<T> for IdentityLevel
where
    T: Ord + Clone + 'static,
{
    fn levels(&self) -> usize {
        1
    }

    fn try_sort_direct(&self, items: &mut [T]) -> bool {
        // The standard sort is stable, so both directions preserve the
        // original relative order of equal elements.
        if self.descending {
            items.sort_by(|a, b| b.cmp(a));
        } else {
            items.sort();
        }
        true
    }

    fn push_steps(&self, items: &[T], steps: &mut Steps) {
        let mut keys = scratch::rent_keys::<T>(items.len());
        keys.extend(items.iter().cloned());
        steps.push(Box::new(TypedStep {
            keys,
            comparer: Natural,
            descending: self.descending,
        }));
    }
}

/// One keyed ordering level linked to its parent levels.
///
/// `then_by` produces a new link whose parent is the previous chain; no
/// existing descriptor is mutated, so ordering stages stay value-semantics.
#[derive(Clone, Debug)]
pub struct KeyedLink<P, F, C> {
    parent: P,
    select: F,
    comparer: C,
    descending: bool,
}

impl<F, C> KeyedLink<(), F, C> {
    pub(crate) fn root(select: F, comparer: C, descending: bool) -> Self {
        Self {
            parent: (),
            select,
            comparer,
            descending,
        }
    }
}

impl<P, F, C> KeyedLink<P, F, C> {
    pub(crate) fn link(parent: P, select: F, comparer: C, descending: bool) -> Self {
        Self {
            parent,
            select,
            comparer,
            descending,
        }
    }
}

impl<T, P, F, K, C> KeyChain<T> for KeyedLink<P, F, C>
where
    P: KeyChain<T>,
    F: Fn(&T) -> K + Clone,
    C: Comparer<K> + Clone + 'static,
    K: 'static,
{
    fn levels(&self) -> usize {
        self.parent.levels() + 1
    }

    fn try_sort_direct(&self, _items: &mut [T]) -> bool {
        false
    }

    fn push_steps(&self, items: &[T], steps: &mut Steps) {
        self.parent.push_steps(items, steps);
        let mut keys = scratch::rent_keys::<K>(items.len());
        keys.extend(items.iter().map(|item| (self.select)(item)));
        steps.push(Box::new(TypedStep {
            keys,
            comparer: self.comparer.clone(),
            descending: self.descending,
        }));
    }
}
