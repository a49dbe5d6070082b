//! Pooled scratch stacks.
//!
//! [`ScratchStack`] is a disposable LIFO scratch container. [`StackPool`]
//! recycles pooled stacks across threads without locks: an owned slot array
//! where every slot transition is a compare-and-swap, so no renter or
//! returner ever blocks another. Pools are plain values, constructed where
//! they are needed and shared by reference; there is no process-wide
//! singleton.

mod shared;
mod stack;

pub use shared::{StackPool, DEFAULT_POOL_CAPACITY};
pub use stack::ScratchStack;
