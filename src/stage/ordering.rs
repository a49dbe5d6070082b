//! The ordering stage: stable multi-key sorting over a lazy pipeline.
//!
//! Sorting is inherently non-streaming, so the stage realizes once per
//! cursor: on first pull it materializes every upstream element through the
//! probe ladder, sorts the buffer, and then indexes into it sequentially.
//!
//! Two sort paths exist. `order()`/`order_descending()` sort the buffer
//! directly in place with the standard library's stable sort. Every other
//! constructor (custom comparer, key selector, or any `then_by` level)
//! takes the general path: extract one key array per level, sort an index
//! map with the flattened comparer chain (a Schwartzian transform, so keys
//! are computed once, not per comparison), then permute the buffer by
//! cycle-following.

use tracing::trace;

use crate::consume;
use crate::error::Result;
use crate::scratch;
use crate::stage::compare::{ChainComparer, Comparer, KeyChain, KeyedLink, Natural, Steps};
use crate::stage::Stage;

/// A pipeline stage that yields its upstream's elements in sorted order.
///
/// Created by the `order*` operators on
/// [`StageExt`](crate::stage::StageExt); extended one key level at a time by
/// [`then_by`](OrderBy::then_by) and its variants.
pub struct OrderBy<S: Stage, Ch> {
    source: S,
    chain: Ch,
    realized: Option<Sorted<S::Item>>,
}

struct Sorted<T> {
    items: Vec<T>,
    pos: usize,
}

impl<S: Stage, Ch> OrderBy<S, Ch> {
    pub(crate) fn new(source: S, chain: Ch) -> Self {
        Self {
            source,
            chain,
            realized: None,
        }
    }
}

impl<S, Ch> OrderBy<S, Ch>
where
    S: Stage,
    S::Item: Clone,
    Ch: KeyChain<S::Item>,
{
    /// Add a secondary ascending key, applied where all earlier levels tie.
    ///
    /// Returns a new ordering stage over the same upstream; the existing
    /// descriptor is consumed, never mutated.
    pub fn then_by<K, F>(self, select: F) -> OrderBy<S, KeyedLink<Ch, F, Natural>>
    where
        F: Fn(&S::Item) -> K + Clone,
        K: Ord + 'static,
    {
        OrderBy::new(
            self.source,
            KeyedLink::link(self.chain, select, Natural, false),
        )
    }

    /// Add a secondary descending key.
    pub fn then_by_descending<K, F>(self, select: F) -> OrderBy<S, KeyedLink<Ch, F, Natural>>
    where
        F: Fn(&S::Item) -> K + Clone,
        K: Ord + 'static,
    {
        OrderBy::new(
            self.source,
            KeyedLink::link(self.chain, select, Natural, true),
        )
    }

    /// Add a secondary ascending key with a custom comparer.
    pub fn then_by_with<K, F, C>(self, select: F, comparer: C) -> OrderBy<S, KeyedLink<Ch, F, C>>
    where
        F: Fn(&S::Item) -> K + Clone,
        C: Comparer<K> + Clone + 'static,
        K: 'static,
    {
        OrderBy::new(
            self.source,
            KeyedLink::link(self.chain, select, comparer, false),
        )
    }

    /// Add a secondary descending key with a custom comparer.
    pub fn then_by_descending_with<K, F, C>(
        self,
        select: F,
        comparer: C,
    ) -> OrderBy<S, KeyedLink<Ch, F, C>>
    where
        F: Fn(&S::Item) -> K + Clone,
        C: Comparer<K> + Clone + 'static,
        K: 'static,
    {
        OrderBy::new(
            self.source,
            KeyedLink::link(self.chain, select, comparer, true),
        )
    }

    fn realize(&mut self) -> Result<()> {
        if self.realized.is_some() {
            return Ok(());
        }
        let mut items = consume::drain_to_vec(&mut self.source)?;
        self.sort_slice(&mut items);
        self.realized = Some(Sorted { items, pos: 0 });
        Ok(())
    }

    fn sort_slice(&self, items: &mut [S::Item]) {
        if items.is_empty() {
            return;
        }
        if self.chain.try_sort_direct(items) {
            trace!(len = items.len(), "ordering: direct in-place sort");
            return;
        }

        let mut steps = Steps::new();
        self.chain.push_steps(items, &mut steps);
        let comparer = ChainComparer::new(steps);

        // The index tie-break makes the chain a total order over distinct
        // indices, so an unstable index sort cannot reorder ties.
        let mut index_map = scratch::rent_index_map(items.len());
        index_map.sort_unstable_by(|&a, &b| comparer.compare(a, b));
        apply_permutation(items, &mut index_map);
        scratch::recycle_index_map(index_map);

        trace!(
            len = items.len(),
            levels = self.chain.levels(),
            "ordering: keyed index sort"
        );
    }
}

impl<S, Ch> Stage for OrderBy<S, Ch>
where
    S: Stage,
    S::Item: Clone,
    Ch: KeyChain<S::Item>,
{
    type Item = S::Item;

    fn try_count(&self) -> Option<usize> {
        // Ordering preserves count, so the probe cascades upstream.
        match &self.realized {
            Some(sorted) => Some(sorted.items.len() - sorted.pos),
            None => self.source.try_count(),
        }
    }

    fn try_as_slice(&mut self) -> Option<&[S::Item]> {
        None
    }

    fn try_copy_into(&mut self, dest: &mut [S::Item]) -> Result<bool> {
        if self.realized.is_some() {
            return Ok(false);
        }
        let Some(count) = self.source.try_count() else {
            return Ok(false);
        };
        if dest.len() < count {
            return Ok(false);
        }
        if !self.source.try_copy_into(&mut dest[..count])? {
            return Ok(false);
        }
        self.sort_slice(&mut dest[..count]);
        Ok(true)
    }

    fn try_next(&mut self) -> Result<Option<S::Item>> {
        self.realize()?;
        let Some(sorted) = self.realized.as_mut() else {
            return Ok(None);
        };
        if sorted.pos < sorted.items.len() {
            let item = sorted.items[sorted.pos].clone();
            sorted.pos += 1;
            Ok(Some(item))
        } else {
            Ok(None)
        }
    }
}

impl<S, Ch> Clone for OrderBy<S, Ch>
where
    S: Stage + Clone,
    Ch: Clone,
{
    /// Cloning yields an unrealized descriptor: each clone runs its own
    /// independent evaluation.
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            chain: self.chain.clone(),
            realized: None,
        }
    }
}

/// Reorder `items` so `items[k]` ends up holding the element that was at
/// `perm[k]`, following permutation cycles in place.
///
/// Consumes `perm` as visited markers; its contents are garbage afterwards.
fn apply_permutation<T>(items: &mut [T], perm: &mut [usize]) {
    const DONE: usize = usize::MAX;
    debug_assert_eq!(items.len(), perm.len());

    for start in 0..perm.len() {
        if perm[start] == DONE {
            continue;
        }
        let mut prev = start;
        let mut cur = perm[start];
        while cur != start {
            items.swap(prev, cur);
            perm[prev] = DONE;
            prev = cur;
            cur = perm[prev];
        }
        perm[prev] = DONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::stage::source::{from_fn, from_iter, from_slice, from_vec};
    use crate::stage::StageExt;

    #[test]
    fn test_apply_permutation_cycles() {
        let mut items = vec!["a", "b", "c"];
        let mut perm = vec![2, 0, 1];
        apply_permutation(&mut items, &mut perm);
        assert_eq!(items, vec!["c", "a", "b"]);

        let mut items = vec![1, 2, 3, 4];
        let mut perm = vec![3, 2, 1, 0];
        apply_permutation(&mut items, &mut perm);
        assert_eq!(items, vec![4, 3, 2, 1]);

        let mut items = vec![5];
        let mut perm = vec![0];
        apply_permutation(&mut items, &mut perm);
        assert_eq!(items, vec![5]);
    }

    #[test]
    fn test_direct_sort_ascending_and_descending() {
        let data = [3, 1, 2];
        assert_eq!(from_slice(&data).order().to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(
            from_slice(&data).order_descending().to_vec().unwrap(),
            vec![3, 2, 1]
        );
    }

    #[test]
    fn test_direct_sort_non_primitive() {
        let data = ["pear", "apple", "plum"];
        assert_eq!(
            from_slice(&data).order().to_vec().unwrap(),
            vec!["apple", "pear", "plum"]
        );
    }

    #[test]
    fn test_stability_with_duplicate_keys() {
        let data = [(1, "a"), (2, "b"), (1, "c")];
        let sorted = from_slice(&data).order_by(|p| p.0).to_vec().unwrap();
        assert_eq!(sorted, vec![(1, "a"), (1, "c"), (2, "b")]);
    }

    #[test]
    fn test_descending_preserves_tie_order() {
        let data = [(1, "a"), (2, "b"), (1, "c")];
        let sorted = from_slice(&data)
            .order_by_descending(|p| p.0)
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![(2, "b"), (1, "a"), (1, "c")]);
    }

    #[test]
    fn test_then_by_composition() {
        let data = [(1, 2), (1, 1), (2, 1)];
        let sorted = from_slice(&data)
            .order_by(|p| p.0)
            .then_by(|p| p.1)
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![(1, 1), (1, 2), (2, 1)]);

        let sorted = from_slice(&data)
            .order_by(|p| p.0)
            .then_by_descending(|p| p.1)
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![(1, 2), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_three_level_chain() {
        let data = [(1, 1, "b"), (1, 1, "a"), (1, 0, "z"), (0, 9, "q")];
        let sorted = from_slice(&data)
            .order_by(|t| t.0)
            .then_by(|t| t.1)
            .then_by(|t| t.2)
            .to_vec()
            .unwrap();
        assert_eq!(
            sorted,
            vec![(0, 9, "q"), (1, 0, "z"), (1, 1, "a"), (1, 1, "b")]
        );
    }

    #[test]
    fn test_full_tie_preserves_original_order_any_direction() {
        let data = [(7, "first"), (7, "second"), (7, "third")];
        let ascending = from_slice(&data)
            .order_by(|p| p.0)
            .then_by(|p| p.0)
            .to_vec()
            .unwrap();
        let descending = from_slice(&data)
            .order_by_descending(|p| p.0)
            .then_by_descending(|p| p.0)
            .to_vec()
            .unwrap();
        assert_eq!(ascending, data.to_vec());
        assert_eq!(descending, data.to_vec());
    }

    #[test]
    fn test_direct_and_general_paths_agree() {
        // order() takes the direct path; order_by with an identity selector
        // takes the keyed path. They must agree on every permutation.
        let permutations = [
            [3, 1, 2],
            [3, 2, 1],
            [1, 3, 2],
            [1, 2, 3],
            [2, 1, 3],
            [2, 3, 1],
        ];
        for perm in permutations {
            let direct = from_slice(&perm).order().to_vec().unwrap();
            let keyed = from_slice(&perm).order_by(|x| *x).to_vec().unwrap();
            assert_eq!(direct, keyed, "paths diverged for {perm:?}");
        }
    }

    #[test]
    fn test_custom_comparer_never_takes_fast_path_shortcut() {
        // A comparer that happens to equal the natural order still goes
        // through the keyed path and must produce the same output.
        let data = [2, 2, 3, 1];
        let natural_like = |a: &i32, b: &i32| a.cmp(b);
        assert_eq!(
            from_slice(&data).order_with(natural_like).to_vec().unwrap(),
            from_slice(&data).order().to_vec().unwrap()
        );
    }

    #[test]
    fn test_order_with_reversed_comparer() {
        let data = [1, 3, 2];
        let sorted = from_slice(&data)
            .order_with(|a: &i32, b: &i32| b.cmp(a))
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![3, 2, 1]);
    }

    #[test]
    fn test_order_descending_with_whole_elements() {
        let data = ["bb", "a", "cc", "d"];
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        let sorted = from_slice(&data)
            .order_descending_with(by_len)
            .to_vec()
            .unwrap();
        // Equal lengths keep original order under a descending comparer.
        assert_eq!(sorted, vec!["bb", "cc", "a", "d"]);
    }

    #[test]
    fn test_order_by_with_custom_key_comparer() {
        let data = [("a", 1), ("b", 3), ("c", 2)];
        let sorted = from_slice(&data)
            .order_by_with(|p| p.1, |a: &i32, b: &i32| b.cmp(a))
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![("b", 3), ("c", 2), ("a", 1)]);
    }

    #[test]
    fn test_order_by_descending_with_reverses_comparer() {
        let data = [2, 1, 3];
        let sorted = from_slice(&data)
            .order_by_descending_with(|x| *x, |a: &i32, b: &i32| b.cmp(a))
            .to_vec()
            .unwrap();
        // Descending over a reversed comparer is ascending.
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn test_then_by_with_secondary_comparer() {
        let data = [(1, "bb"), (2, "a"), (1, "c"), (1, "dd")];
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        let sorted = from_slice(&data)
            .order_by(|p| p.0)
            .then_by_with(|p| p.1, by_len)
            .to_vec()
            .unwrap();
        // Secondary compares by length; equal lengths keep original order.
        assert_eq!(sorted, vec![(1, "c"), (1, "bb"), (1, "dd"), (2, "a")]);
    }

    #[test]
    fn test_then_by_descending_with_secondary_comparer() {
        let data = [(1, "bb"), (1, "c"), (1, "dd"), (2, "e")];
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        let sorted = from_slice(&data)
            .order_by(|p| p.0)
            .then_by_descending_with(|p| p.1, by_len)
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![(1, "bb"), (1, "dd"), (1, "c"), (2, "e")]);
    }

    #[test]
    fn test_then_by_on_natural_order() {
        let data = [(2, 9), (1, 9), (2, 1)];
        let sorted = from_slice(&data)
            .order()
            .then_by_descending(|p| p.1)
            .to_vec()
            .unwrap();
        // Natural tuple order already decides; the chain must not disturb it.
        assert_eq!(sorted, vec![(1, 9), (2, 1), (2, 9)]);
    }

    #[test]
    fn test_count_probe_cascades() {
        let data = [4, 2, 3, 1];
        let stage = from_slice(&data).order_by(|x| *x);
        assert_eq!(stage.try_count(), Some(4));
        assert_eq!(stage.to_vec().unwrap().len(), 4);
    }

    #[test]
    fn test_copy_probe_sorts_destination() {
        let data = [(2, "x"), (1, "y"), (2, "w")];
        let mut dest = [(0, ""); 3];
        let n = from_slice(&data)
            .order_by(|p| p.0)
            .copy_into(&mut dest)
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(dest, [(1, "y"), (2, "x"), (2, "w")]);
    }

    #[test]
    fn test_copy_probe_undersized_destination() {
        let data = [3, 1, 2];
        let mut dest = [0; 2];
        let err = from_slice(&data).order().copy_into(&mut dest).unwrap_err();
        assert!(matches!(err, Error::DestinationTooSmall { need: 3, have: 2 }));
    }

    #[test]
    fn test_empty_source_every_path() {
        let data: [i32; 0] = [];

        // Count probe.
        assert_eq!(from_slice(&data).order().count().unwrap(), 0);
        // Copy probe.
        let mut dest: [i32; 0] = [];
        assert_eq!(from_slice(&data).order().copy_into(&mut dest).unwrap(), 0);
        // Pull probe.
        let mut stage = from_slice(&data).order_by(|x| *x);
        assert_eq!(stage.try_next().unwrap(), None);
    }

    #[test]
    fn test_pull_over_unsized_source() {
        let sorted = from_iter(vec![30, 10, 20]).order().to_vec().unwrap();
        assert_eq!(sorted, vec![10, 20, 30]);
    }

    #[test]
    fn test_cloned_descriptor_evaluates_independently() {
        let stage = from_vec(vec![2, 1, 3]).order();
        let twin = stage.clone();
        assert_eq!(stage.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(twin.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_realizes_once_per_cursor() {
        let data = [2, 1];
        let mut stage = from_slice(&data).order();
        assert_eq!(stage.try_next().unwrap(), Some(1));
        assert_eq!(stage.try_count(), Some(1));
        assert_eq!(stage.try_next().unwrap(), Some(2));
        assert_eq!(stage.try_next().unwrap(), None);
    }

    #[test]
    fn test_upstream_error_propagates_through_sort() {
        let mut n = 0;
        let stage = from_fn(move || {
            n += 1;
            if n > 2 {
                Err(Error::Source("bad element".into()))
            } else {
                Ok(Some(n))
            }
        });
        let result = stage.order_by(|x| *x).to_vec();
        assert!(matches!(result, Err(Error::Source(_))));
    }

    #[test]
    fn test_sort_after_combinators() {
        let sorted = from_iter(0..10)
            .filter(|x| x % 2 == 0)
            .map(|x| 10 - x)
            .order()
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![2, 4, 6, 8, 10]);
    }
}
