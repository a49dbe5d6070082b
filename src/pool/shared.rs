//! Lock-free bounded pool of scratch stacks.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::trace;

use crate::error::{Error, Result};
use crate::pool::ScratchStack;

/// Capacity used by [`StackPool::default`].
pub const DEFAULT_POOL_CAPACITY: usize = 32;

const STATE_FREE: u8 = 0;
const STATE_OCCUPIED: u8 = 1;
const STATE_CLAIMED: u8 = 2;

/// One pool entry: an atomic state byte guarding an exclusively-owned payload.
///
/// State machine: `FREE` (no payload) and `OCCUPIED` (payload present) are
/// stable; `CLAIMED` is a transient claim held by exactly one thread while it
/// moves the payload in or out. A successful compare-and-swap into `CLAIMED`
/// grants exclusive payload access until the claimant publishes the next
/// stable state.
struct Slot<T> {
    state: AtomicU8,
    payload: UnsafeCell<Option<ScratchStack<T>>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_FREE),
            payload: UnsafeCell::new(None),
        }
    }
}

/// A bounded, lock-free pool recycling [`ScratchStack`]s across threads.
///
/// The pool is an explicit object: construct one per subsystem (or per test)
/// and share it by reference. [`rent`](Self::rent) always succeeds, falling
/// back to a fresh allocation when every slot is empty or contended;
/// [`give_back`](Self::give_back) silently drops the stack when the pool is
/// full. Neither operation ever blocks another thread.
///
/// # Example
///
/// ```rust
/// use sluice::pool::StackPool;
///
/// let pool = StackPool::new(4).unwrap();
/// let mut stack = pool.rent();
/// stack.push(42).unwrap();
/// stack.try_pop().unwrap();
/// pool.give_back(stack);
/// assert_eq!(pool.size(), 1);
/// ```
pub struct StackPool<T> {
    slots: Box<[Slot<T>]>,
}

// The payload cells are only touched under an exclusive CLAIMED transition,
// and the claim CAS/publish pair carries the acquire/release edge between
// successive holders.
unsafe impl<T: Send> Send for StackPool<T> {}
unsafe impl<T: Send> Sync for StackPool<T> {}

impl<T> StackPool<T> {
    /// Create a pool holding at most `capacity` idle stacks.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument(
                "pool capacity must be > 0".into(),
            ));
        }
        Ok(Self {
            slots: Self::build_slots(capacity),
        })
    }

    fn build_slots(capacity: usize) -> Box<[Slot<T>]> {
        (0..capacity).map(|_| Slot::new()).collect()
    }

    /// Rent a stack, reusing a pooled one when available.
    ///
    /// Scans for an occupied slot and claims it with a compare-and-swap; a
    /// lost race just moves the scan along. When no idle stack is found the
    /// pool allocates a fresh one, so renting never fails and never blocks.
    pub fn rent(&self) -> ScratchStack<T> {
        for slot in self.slots.iter() {
            if slot
                .state
                .compare_exchange(
                    STATE_OCCUPIED,
                    STATE_CLAIMED,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                // CLAIMED grants exclusive payload access.
                let taken = unsafe { (*slot.payload.get()).take() };
                slot.state.store(STATE_FREE, Ordering::Release);

                match taken {
                    Some(stack) if !stack.is_disposed() => {
                        trace!(stamp = stack.stamp(), "pool: reusing idle stack");
                        return stack;
                    }
                    // A disposed entry must never reach a renter; drop it
                    // and keep scanning.
                    _ => continue,
                }
            }
        }
        trace!("pool: allocating fresh stack");
        ScratchStack::pooled()
    }

    /// Return a stack to the pool.
    ///
    /// Disposed and thread-confined stacks are dropped, never pooled. A
    /// poolable stack is reset, then stored in the first free slot won by
    /// compare-and-swap; when every slot is taken the stack is dropped.
    pub fn give_back(&self, stack: ScratchStack<T>) {
        if stack.is_disposed() || !stack.is_pooled() {
            trace!(stamp = stack.stamp(), "pool: dropping non-poolable stack");
            return;
        }

        let mut stack = stack;
        stack.reset();

        let mut stack = Some(stack);
        for slot in self.slots.iter() {
            if slot
                .state
                .compare_exchange(
                    STATE_FREE,
                    STATE_CLAIMED,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                // CLAIMED grants exclusive payload access; the release store
                // publishes the payload to the next renter.
                unsafe {
                    *slot.payload.get() = stack.take();
                }
                slot.state.store(STATE_OCCUPIED, Ordering::Release);
                return;
            }
        }
        trace!("pool: full, dropping returned stack");
    }

    /// Drop every idle stack, leaving the pool empty.
    ///
    /// Only slots won by compare-and-swap are drained; an entry claimed
    /// concurrently by a renter is that renter's to keep. Outstanding rented
    /// stacks are unaffected and may still be returned afterwards.
    pub fn trim(&self) {
        let mut dropped = 0usize;
        for slot in self.slots.iter() {
            if slot
                .state
                .compare_exchange(
                    STATE_OCCUPIED,
                    STATE_CLAIMED,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                // CLAIMED grants exclusive payload access.
                let stack = unsafe { (*slot.payload.get()).take() };
                slot.state.store(STATE_FREE, Ordering::Release);
                drop(stack);
                dropped += 1;
            }
        }
        trace!(dropped, "pool: trimmed idle stacks");
    }

    /// Snapshot of the number of idle stacks currently held.
    pub fn size(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state.load(Ordering::Relaxed) == STATE_OCCUPIED)
            .count()
    }

    /// Most idle stacks the pool can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Default for StackPool<T> {
    fn default() -> Self {
        Self {
            slots: Self::build_slots(DEFAULT_POOL_CAPACITY),
        }
    }
}
