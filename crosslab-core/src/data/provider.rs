//! Data provider trait and structured fetch errors.
//!
//! The DataProvider trait abstracts over data sources (Alpha Vantage, CSV
//! import, synthetic walks) so the pipeline can swap implementations and tests
//! can run without a network.

use thiserror::Error;

use crate::domain::{Interval, PriceSeries};

/// Errors a provider can surface. The engine never retries these; only the
/// provider's own retry loop looks at [`FetchError::is_retryable`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("symbol not found: {symbol}")]
    NotFound { symbol: String },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("request timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Bad or missing API key, or an endpoint the key's plan does not cover.
    #[error("request refused by provider: {0}")]
    AccessDenied(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("provider unavailable: circuit breaker is open")]
    CircuitOpen,

    #[error("i/o error: {0}")]
    Io(String),
}

impl FetchError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::Timeout { .. } | FetchError::Network(_)
        )
    }
}

/// Source of price history for a single symbol.
///
/// Implementations return a canonical series: ascending, deduplicated, with
/// normalized OHLCV columns.
pub trait DataProvider: Send + Sync {
    /// Short identifier used in logs and run results.
    fn name(&self) -> &str;

    fn fetch(&self, symbol: &str, interval: Interval) -> Result<PriceSeries, FetchError>;

    /// False while the provider is refusing requests (breaker open, missing file).
    fn is_available(&self) -> bool;
}
