//! CrossLab Runner — backtest orchestration and metrics.
//!
//! This crate builds on `crosslab-core` to provide:
//! - TOML configuration with fail-fast validation
//! - Provider construction and series loading with a dataset fingerprint
//! - Single-backtest runner (fetch → signals → positions → simulation)
//! - Performance metrics with an explicit undefined result

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, ProviderConfig, ProviderKind, RunId};
pub use data_loader::{build_provider, load_series, LoadError, LoadedData};
pub use metrics::{MetricsError, PerformanceMetrics, ANNUALIZATION_FACTOR};
pub use runner::{run_backtest_from_series, run_single_backtest, BacktestResult, RunError};
