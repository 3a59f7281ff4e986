//! Market data acquisition
//!
//! Providers hand back a canonical [`PriceSeries`](crate::domain::PriceSeries);
//! everything downstream of `fetch` is pure.

pub mod alpha_vantage;
pub mod circuit_breaker;
pub mod csv_provider;
pub mod normalize;
pub mod provider;
pub mod retry;
pub mod synthetic;

pub use crate::domain::Interval;
pub use alpha_vantage::AlphaVantageProvider;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_provider::CsvProvider;
pub use normalize::{canonicalize, parse_timestamp, Column, ColumnMap};
pub use provider::{DataProvider, FetchError};
pub use retry::RetryPolicy;
pub use synthetic::SyntheticProvider;
