//! Engine error taxonomy.

use thiserror::Error;

/// Errors raised by the pure pipeline stages.
///
/// Fetch failures live in [`crate::data::FetchError`]; these cover the checks
/// that happen after a series is in hand.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    /// A window, ordering, or capital precondition was violated.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Fewer usable bars than the sample threshold after warm-up and lag filtering.
    #[error(
        "insufficient data for meaningful backtesting: {usable} usable bars, need at least {required}. Fetch a larger dataset."
    )]
    InsufficientData { usable: usize, required: usize },
}
