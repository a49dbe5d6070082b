//! Source adapters: the entry points of a pipeline.
//!
//! Slice and vector sources answer every probe directly; arbitrary iterators
//! and fallible producers are pull-only.

use crate::error::Result;
use crate::stage::Stage;

/// Wrap a borrowed slice as a pipeline source.
///
/// Answers all four probes: the count and contiguous view come straight from
/// the slice, bulk copy is a single `clone_from_slice`.
pub fn from_slice<T: Clone>(items: &[T]) -> FromSlice<'_, T> {
    FromSlice { items, pos: 0 }
}

/// Wrap an owned vector as a pipeline source.
pub fn from_vec<T: Clone>(items: Vec<T>) -> FromVec<T> {
    FromVec { items, pos: 0 }
}

/// Wrap any iterable as a pull-only pipeline source.
///
/// Iterator size hints are advisory, so this source deliberately refuses the
/// count probe; consumers degrade to the pull path.
pub fn from_iter<I: IntoIterator>(items: I) -> FromIter<I::IntoIter> {
    FromIter {
        iter: items.into_iter(),
    }
}

/// Wrap a fallible producer as a pull-only pipeline source.
///
/// The producer follows the pull contract directly: `Ok(Some(item))` yields,
/// `Ok(None)` ends the sequence, and errors propagate synchronously to the
/// consumer. This is the seam for external collaborators whose production can
/// fail (e.g. an overflowing numeric reduction).
pub fn from_fn<T, F>(produce: F) -> FromFn<F>
where
    F: FnMut() -> Result<Option<T>>,
{
    FromFn { produce }
}

// ============================================================================
// Slice Source
// ============================================================================

/// Source over a borrowed slice. Created by [`from_slice`].
#[derive(Clone, Debug)]
pub struct FromSlice<'a, T> {
    items: &'a [T],
    pos: usize,
}

impl<T: Clone> Stage for FromSlice<'_, T> {
    type Item = T;

    fn try_count(&self) -> Option<usize> {
        Some(self.items.len() - self.pos)
    }

    fn try_as_slice(&mut self) -> Option<&[T]> {
        Some(&self.items[self.pos..])
    }

    fn try_copy_into(&mut self, dest: &mut [T]) -> Result<bool> {
        let rest = &self.items[self.pos..];
        if dest.len() < rest.len() {
            return Ok(false);
        }
        dest[..rest.len()].clone_from_slice(rest);
        Ok(true)
    }

    fn try_next(&mut self) -> Result<Option<T>> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        Ok(item)
    }
}

// ============================================================================
// Vec Source
// ============================================================================

/// Source over an owned vector. Created by [`from_vec`].
#[derive(Clone, Debug)]
pub struct FromVec<T> {
    items: Vec<T>,
    pos: usize,
}

impl<T: Clone> Stage for FromVec<T> {
    type Item = T;

    fn try_count(&self) -> Option<usize> {
        Some(self.items.len() - self.pos)
    }

    fn try_as_slice(&mut self) -> Option<&[T]> {
        Some(&self.items[self.pos..])
    }

    fn try_copy_into(&mut self, dest: &mut [T]) -> Result<bool> {
        let rest = &self.items[self.pos..];
        if dest.len() < rest.len() {
            return Ok(false);
        }
        dest[..rest.len()].clone_from_slice(rest);
        Ok(true)
    }

    fn try_next(&mut self) -> Result<Option<T>> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        Ok(item)
    }
}

// ============================================================================
// Iterator Source
// ============================================================================

/// Pull-only source over an arbitrary iterator. Created by [`from_iter`].
#[derive(Clone, Debug)]
pub struct FromIter<I> {
    iter: I,
}

impl<I: Iterator> Stage for FromIter<I> {
    type Item = I::Item;

    fn try_count(&self) -> Option<usize> {
        None
    }

    fn try_as_slice(&mut self) -> Option<&[I::Item]> {
        None
    }

    fn try_copy_into(&mut self, _dest: &mut [I::Item]) -> Result<bool> {
        Ok(false)
    }

    fn try_next(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }
}

// ============================================================================
// Fallible Producer Source
// ============================================================================

/// Pull-only source over a fallible producer. Created by [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    produce: F,
}

impl<T, F> Stage for FromFn<F>
where
    F: FnMut() -> Result<Option<T>>,
{
    type Item = T;

    fn try_count(&self) -> Option<usize> {
        None
    }

    fn try_as_slice(&mut self) -> Option<&[T]> {
        None
    }

    fn try_copy_into(&mut self, _dest: &mut [T]) -> Result<bool> {
        Ok(false)
    }

    fn try_next(&mut self) -> Result<Option<T>> {
        (self.produce)()
    }
}
