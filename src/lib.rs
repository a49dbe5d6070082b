//! # Sluice
//!
//! Lazy, composable sequence pipelines with capability-probing stages.
//!
//! Sluice lets callers build pull-based pipelines over arbitrary data sources
//! (slices, vectors, iterators, fallible producers) and evaluate them with
//! minimal heap allocation. Each stage implements a uniform four-probe
//! protocol, so terminal consumers can negotiate the cheapest realization
//! strategy (known count, contiguous view, bulk copy) before falling back to
//! one-at-a-time pulls.
//!
//! ## Features
//!
//! - **Capability probing**: stages advertise cheap shortcuts instead of
//!   always iterating
//! - **Stable multi-key ordering**: `order_by` + chained `then_by` levels via
//!   an index-indirected Schwartzian transform
//! - **Lock-free scratch pooling**: bounded, injectable [`pool::StackPool`]
//!   for recycling transient scratch objects across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use sluice::prelude::*;
//!
//! let pairs = vec![(1, "a"), (2, "b"), (1, "c")];
//! let sorted = from_vec(pairs)
//!     .order_by(|p: &(i32, &str)| p.0)
//!     .to_vec()
//!     .unwrap();
//! assert_eq!(sorted, vec![(1, "a"), (1, "c"), (2, "b")]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

mod consume;
pub mod error;
pub mod pool;
mod scratch;
pub mod stage;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::pool::{ScratchStack, StackPool};
    pub use crate::stage::source::{from_fn, from_iter, from_slice, from_vec};
    pub use crate::stage::{Comparer, Natural, OrderBy, Stage, StageExt};
}

pub use error::{Error, Result};
