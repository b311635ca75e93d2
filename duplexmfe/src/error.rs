//! Error types used by this crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A prediction range is not ascending or starts beyond the sequence end.
    #[error("index range [{from}, {to}] is not valid for a sequence of length {len}")]
    InvalidRange {
        /// First index of the offending range.
        from: usize,
        /// Last index of the offending range.
        to: usize,
        /// Length of the sequence the range was applied to.
        len: usize,
    },
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
