//! Error types for sluice.

use thiserror::Error;

/// Result type alias using sluice's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sluice operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was attempted on an already-disposed object.
    #[error("operation `{0}` on a disposed stack")]
    Disposed(&'static str),

    /// The destination buffer cannot hold the full result.
    #[error("destination too small: need {need} elements, have {have}")]
    DestinationTooSmall {
        /// Number of elements the result requires.
        need: usize,
        /// Number of elements the destination can hold.
        have: usize,
    },

    /// An upstream producer failed while yielding an element.
    #[error("source failed: {0}")]
    Source(String),
}
