//! Probe-forwarding combinators.
//!
//! Each combinator is a value-semantics wrapper owning its upstream stage.
//! A combinator forwards a probe when its own transform keeps the probe's
//! answer valid (a count-preserving map forwards the count; take/skip adjust
//! it arithmetically) and opts out where it cannot answer cheaply (a filter
//! refuses everything but the pull path).

use crate::error::Result;
use crate::stage::Stage;

// ============================================================================
// Map
// ============================================================================

/// Count-preserving element transform. Created by
/// [`StageExt::map`](crate::stage::StageExt::map).
#[derive(Clone, Debug)]
pub struct Map<S, F> {
    source: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self { source, f }
    }
}

impl<S, F, U> Stage for Map<S, F>
where
    S: Stage,
    F: FnMut(S::Item) -> U,
{
    type Item = U;

    fn try_count(&self) -> Option<usize> {
        self.source.try_count()
    }

    fn try_as_slice(&mut self) -> Option<&[U]> {
        // The upstream block holds untransformed elements.
        None
    }

    fn try_copy_into(&mut self, _dest: &mut [U]) -> Result<bool> {
        Ok(false)
    }

    fn try_next(&mut self) -> Result<Option<U>> {
        Ok(self.source.try_next()?.map(&mut self.f))
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Predicate stage. Refuses every cheap probe: its count depends on the
/// predicate. Created by [`StageExt::filter`](crate::stage::StageExt::filter).
#[derive(Clone, Debug)]
pub struct Filter<S, P> {
    source: S,
    predicate: P,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        Self { source, predicate }
    }
}

impl<S, P> Stage for Filter<S, P>
where
    S: Stage,
    P: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn try_count(&self) -> Option<usize> {
        None
    }

    fn try_as_slice(&mut self) -> Option<&[S::Item]> {
        None
    }

    fn try_copy_into(&mut self, _dest: &mut [S::Item]) -> Result<bool> {
        Ok(false)
    }

    fn try_next(&mut self) -> Result<Option<S::Item>> {
        while let Some(item) = self.source.try_next()? {
            if (self.predicate)(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// Take
// ============================================================================

/// Yields at most a fixed number of elements. Created by
/// [`StageExt::take`](crate::stage::StageExt::take).
#[derive(Clone, Debug)]
pub struct Take<S> {
    source: S,
    remaining: usize,
}

impl<S> Take<S> {
    pub(crate) fn new(source: S, limit: usize) -> Self {
        Self {
            source,
            remaining: limit,
        }
    }
}

impl<S: Stage> Stage for Take<S> {
    type Item = S::Item;

    fn try_count(&self) -> Option<usize> {
        self.source.try_count().map(|n| n.min(self.remaining))
    }

    fn try_as_slice(&mut self) -> Option<&[S::Item]> {
        let remaining = self.remaining;
        self.source
            .try_as_slice()
            .map(|s| &s[..s.len().min(remaining)])
    }

    fn try_copy_into(&mut self, dest: &mut [S::Item]) -> Result<bool> {
        // Forwardable only when the limit does not truncate the upstream.
        match self.source.try_count() {
            Some(n) if n <= self.remaining => self.source.try_copy_into(dest),
            _ => Ok(false),
        }
    }

    fn try_next(&mut self) -> Result<Option<S::Item>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let item = self.source.try_next()?;
        if item.is_some() {
            self.remaining -= 1;
        }
        Ok(item)
    }
}

// ============================================================================
// Skip
// ============================================================================

/// Discards a fixed-length prefix. Created by
/// [`StageExt::skip`](crate::stage::StageExt::skip).
#[derive(Clone, Debug)]
pub struct Skip<S> {
    source: S,
    count: usize,
    skipped: bool,
}

impl<S> Skip<S> {
    pub(crate) fn new(source: S, count: usize) -> Self {
        Self {
            source,
            count,
            skipped: false,
        }
    }
}

impl<S: Stage> Stage for Skip<S> {
    type Item = S::Item;

    fn try_count(&self) -> Option<usize> {
        let pending = if self.skipped { 0 } else { self.count };
        self.source.try_count().map(|n| n.saturating_sub(pending))
    }

    fn try_as_slice(&mut self) -> Option<&[S::Item]> {
        let pending = if self.skipped { 0 } else { self.count };
        self.source
            .try_as_slice()
            .map(|s| &s[pending.min(s.len())..])
    }

    fn try_copy_into(&mut self, _dest: &mut [S::Item]) -> Result<bool> {
        Ok(false)
    }

    fn try_next(&mut self) -> Result<Option<S::Item>> {
        if !self.skipped {
            self.skipped = true;
            for _ in 0..self.count {
                if self.source.try_next()?.is_none() {
                    return Ok(None);
                }
            }
        }
        self.source.try_next()
    }
}
