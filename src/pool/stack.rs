//! Disposable LIFO scratch container.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Reset shrinks backing buffers that grew past this capacity.
const SHRINK_THRESHOLD: usize = 1024;
/// Reset never shrinks below this capacity.
const MIN_RETAINED_CAPACITY: usize = 4;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// A disposable LIFO stack for transient scratch elements.
///
/// Created in one of two modes:
///
/// - **Thread-confined** ([`ScratchStack::confined`]): owned by one thread
///   for its whole life. Never recycled by a pool; debug builds assert every
///   operation runs on the creating thread.
/// - **Pooled** (returned by [`StackPool::rent`](super::StackPool::rent)):
///   eligible for recycling through the pool that issued it. Successive
///   holders may be different threads; the pool's slot transitions order
///   their accesses.
///
/// Disposal is explicit and idempotent: [`dispose`](Self::dispose) drops all
/// elements, and every later operation fails with [`Error::Disposed`].
pub struct ScratchStack<T> {
    items: Vec<T>,
    disposed: bool,
    pooled: bool,
    /// Unique diagnostic identity, assigned at creation, never reused.
    stamp: u64,
    #[cfg(debug_assertions)]
    owner: Option<std::thread::ThreadId>,
}

impl<T> ScratchStack<T> {
    /// Create a thread-confined stack. It is never accepted back by a pool.
    pub fn confined() -> Self {
        Self {
            items: Vec::new(),
            disposed: false,
            pooled: false,
            stamp: NEXT_STAMP.fetch_add(1, Ordering::Relaxed),
            #[cfg(debug_assertions)]
            owner: Some(std::thread::current().id()),
        }
    }

    /// Create a pool-eligible stack. Only pools hand these out.
    pub(crate) fn pooled() -> Self {
        Self {
            items: Vec::new(),
            disposed: false,
            pooled: true,
            stamp: NEXT_STAMP.fetch_add(1, Ordering::Relaxed),
            #[cfg(debug_assertions)]
            owner: None,
        }
    }

    fn ensure_live(&self, op: &'static str) -> Result<()> {
        #[cfg(debug_assertions)]
        if let Some(owner) = self.owner {
            debug_assert_eq!(
                owner,
                std::thread::current().id(),
                "confined stack used from a foreign thread"
            );
        }
        if self.disposed {
            return Err(Error::Disposed(op));
        }
        Ok(())
    }

    /// Push an element.
    pub fn push(&mut self, item: T) -> Result<()> {
        self.ensure_live("push")?;
        self.items.push(item);
        Ok(())
    }

    /// Pop the top element, transferring ownership to the caller.
    ///
    /// Returns `Ok(None)` when the stack is empty.
    pub fn try_pop(&mut self) -> Result<Option<T>> {
        self.ensure_live("try_pop")?;
        Ok(self.items.pop())
    }

    /// Pop and drop the top element. A no-op on an empty stack.
    pub fn pop(&mut self) -> Result<()> {
        self.ensure_live("pop")?;
        self.items.pop();
        Ok(())
    }

    /// Peek at the top element without removing it.
    pub fn try_peek(&self) -> Result<Option<&T>> {
        self.ensure_live("try_peek")?;
        Ok(self.items.last())
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no elements are held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// True once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Unique diagnostic identity of this stack.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub(crate) fn is_pooled(&self) -> bool {
        self.pooled
    }

    /// Drop all elements and mark the stack disposed. Idempotent.
    ///
    /// A disposed stack refuses every operation and is never pooled again.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.items.clear();
        self.disposed = true;
    }

    /// Clear for recycling, halving an overgrown backing buffer.
    pub(crate) fn reset(&mut self) {
        self.items.clear();
        let cap = self.items.capacity();
        if cap > SHRINK_THRESHOLD {
            self.items.shrink_to(MIN_RETAINED_CAPACITY.max(cap / 2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_push_pop_peek() {
        let mut stack = ScratchStack::confined();
        stack.push(1).unwrap();
        stack.push(2).unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.try_peek().unwrap(), Some(&2));
        assert_eq!(stack.try_pop().unwrap(), Some(2));
        assert_eq!(stack.try_pop().unwrap(), Some(1));
        assert_eq!(stack.try_pop().unwrap(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_drops_element() {
        let tracked = Arc::new(());
        let mut stack = ScratchStack::confined();
        stack.push(Arc::clone(&tracked)).unwrap();
        assert_eq!(Arc::strong_count(&tracked), 2);

        stack.pop().unwrap();
        assert_eq!(Arc::strong_count(&tracked), 1);

        // Empty pop is a no-op.
        stack.pop().unwrap();
    }

    #[test]
    fn test_try_pop_transfers_ownership() {
        let tracked = Arc::new(());
        let mut stack = ScratchStack::confined();
        stack.push(Arc::clone(&tracked)).unwrap();

        let taken = stack.try_pop().unwrap().unwrap();
        assert_eq!(Arc::strong_count(&tracked), 2);
        drop(taken);
        assert_eq!(Arc::strong_count(&tracked), 1);
    }

    #[test]
    fn test_dispose_is_idempotent_and_drops_elements() {
        let tracked = Arc::new(());
        let mut stack = ScratchStack::confined();
        stack.push(Arc::clone(&tracked)).unwrap();

        stack.dispose();
        assert!(stack.is_disposed());
        assert_eq!(Arc::strong_count(&tracked), 1);

        stack.dispose();
        assert!(stack.is_disposed());
    }

    #[test]
    fn test_disposed_stack_refuses_operations() {
        let mut stack = ScratchStack::<i32>::confined();
        stack.dispose();

        assert!(matches!(stack.push(1), Err(Error::Disposed("push"))));
        assert!(matches!(stack.try_pop(), Err(Error::Disposed("try_pop"))));
        assert!(matches!(stack.pop(), Err(Error::Disposed("pop"))));
        assert!(matches!(stack.try_peek(), Err(Error::Disposed("try_peek"))));
    }

    #[test]
    fn test_stamps_are_unique() {
        let a = ScratchStack::<i32>::confined();
        let b = ScratchStack::<i32>::confined();
        let c = ScratchStack::<i32>::pooled();
        assert_ne!(a.stamp(), b.stamp());
        assert_ne!(b.stamp(), c.stamp());
    }

    #[test]
    fn test_reset_shrinks_overgrown_buffer() {
        let mut stack = ScratchStack::confined();
        for i in 0..(SHRINK_THRESHOLD * 2) {
            stack.push(i).unwrap();
        }
        let grown = stack.capacity();
        assert!(grown > SHRINK_THRESHOLD);

        stack.reset();
        assert!(stack.is_empty());
        assert!(stack.capacity() < grown);
        assert!(stack.capacity() >= MIN_RETAINED_CAPACITY);
    }

    #[test]
    fn test_reset_keeps_small_buffer() {
        let mut stack = ScratchStack::confined();
        for i in 0..8 {
            stack.push(i).unwrap();
        }
        let cap = stack.capacity();
        stack.reset();
        assert_eq!(stack.capacity(), cap);
    }
}
