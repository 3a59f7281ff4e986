//! Backtest runner: config in, signals, performance and metrics out.

use thiserror::Error;
use tracing::{debug, info, warn};

use crosslab_core::data::Interval;
use crosslab_core::domain::PriceSeries;
use crosslab_core::engine::{simulate, PerformanceRecord};
use crosslab_core::signals::{map_positions, MovingAverageCrossover, SignalGenerator, SignalRecord};
use crosslab_core::BacktestError;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{compute_dataset_hash, load_series, LoadError};
use crate::metrics::{MetricsError, PerformanceMetrics};

/// Errors from the backtest runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

impl RunError {
    /// True when the run stopped for lack of history rather than a fault.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, RunError::Backtest(BacktestError::InsufficientData { .. }))
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub run_id: RunId,
    pub symbol: String,
    pub interval: Interval,
    pub initial_capital: f64,
    pub dataset_hash: String,
    /// Provider that supplied the series; `None` for an in-memory series.
    pub provider: Option<String>,
    pub synthetic: bool,
    /// Bars in the fetched series.
    pub bar_count: usize,
    /// Leading bars without a defined signal.
    pub warmup_bars: usize,
    /// One record per fetched bar, positions mapped.
    pub signals: Vec<SignalRecord>,
    /// Retained rows only.
    pub performance: Vec<PerformanceRecord>,
    pub metrics: Result<PerformanceMetrics, MetricsError>,
}

impl BacktestResult {
    pub fn final_value(&self) -> Option<f64> {
        self.performance.last().map(|p| p.portfolio_value)
    }
}

/// Validate, fetch, and run. This is the entry point used by the CLI.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_series(config)?;
    let mut result = run_pipeline(config, &loaded.series, loaded.dataset_hash)?;
    result.provider = Some(loaded.provider);
    result.synthetic = loaded.synthetic;
    Ok(result)
}

/// Run the pure pipeline over an in-memory series. No I/O.
///
/// The series' own symbol and interval are reported; the config supplies the
/// windows, capital, and sample threshold.
pub fn run_backtest_from_series(
    config: &BacktestConfig,
    series: &PriceSeries,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    run_pipeline(config, series, compute_dataset_hash(series))
}

fn run_pipeline(
    config: &BacktestConfig,
    series: &PriceSeries,
    dataset_hash: String,
) -> Result<BacktestResult, RunError> {
    let generator =
        MovingAverageCrossover::new(config.strategy.short_window, config.strategy.long_window)?;

    let signals = map_positions(&generator.generate(series));
    let warmup_bars = signals.iter().take_while(|r| r.signal.is_none()).count();
    debug!(
        strategy = generator.name(),
        bars = signals.len(),
        warmup = warmup_bars,
        expected_warmup = generator.warmup_bars(),
        "signals mapped to positions"
    );

    let performance = simulate(
        &signals,
        config.backtest.initial_capital,
        config.backtest.min_usable_bars,
    )?;

    let metrics = PerformanceMetrics::compute(&performance);
    match &metrics {
        Ok(m) => info!(
            symbol = series.symbol(),
            bars = performance.len(),
            total_return = m.total_return,
            sharpe = m.sharpe_ratio,
            "backtest complete"
        ),
        Err(e) => warn!(symbol = series.symbol(), error = %e, "metrics undefined"),
    }

    Ok(BacktestResult {
        run_id: config.run_id(),
        symbol: series.symbol().to_string(),
        interval: series.interval(),
        initial_capital: config.backtest.initial_capital,
        dataset_hash,
        provider: None,
        synthetic: false,
        bar_count: series.len(),
        warmup_bars,
        signals,
        performance,
        metrics,
    })
}
