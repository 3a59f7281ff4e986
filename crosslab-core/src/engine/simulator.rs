//! Portfolio simulation by compounding lagged-position returns.
//!
//! Input is the output of [`map_positions`](crate::signals::map_positions).
//! Rows whose moving averages or position are undefined are dropped first; the
//! remaining rows are simulated in timestamp order.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BacktestError;
use crate::signals::{Direction, SignalRecord};

/// One trading year of daily bars, applied regardless of bar interval.
pub const DEFAULT_MIN_USABLE_BARS: usize = 252;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Per-bar simulation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub position: Direction,
    /// `None` on the first retained bar.
    pub daily_return: Option<f64>,
    /// `position * daily_return`; `None` wherever `daily_return` is.
    pub strategy_return: Option<f64>,
    pub portfolio_value: f64,
}

/// Cumulative value of `initial_capital` compounded by `returns`.
/// Undefined returns count as zero.
pub fn compound(initial_capital: f64, returns: &[Option<f64>]) -> Vec<f64> {
    let mut value = initial_capital;
    returns
        .iter()
        .map(|r| {
            value *= 1.0 + r.unwrap_or(0.0);
            value
        })
        .collect()
}

/// Simulate the strategy over `records`.
///
/// # Errors
/// - `InvalidParameter` if `initial_capital` is not finite and positive.
/// - `InsufficientData` if fewer than `min_usable_bars` rows survive filtering.
pub fn simulate(
    records: &[SignalRecord],
    initial_capital: f64,
    min_usable_bars: usize,
) -> Result<Vec<PerformanceRecord>, BacktestError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(BacktestError::InvalidParameter(format!(
            "initial capital must be a positive number, got {initial_capital}"
        )));
    }

    let retained: Vec<(&SignalRecord, Direction)> = records
        .iter()
        .filter(|r| r.short_ma.is_some() && r.long_ma.is_some())
        .filter_map(|r| r.position.map(|p| (r, p)))
        .collect();

    debug!(
        input = records.len(),
        retained = retained.len(),
        required = min_usable_bars,
        "filtered warm-up and lag rows"
    );

    if retained.len() < min_usable_bars {
        return Err(BacktestError::InsufficientData {
            usable: retained.len(),
            required: min_usable_bars,
        });
    }

    let daily_returns: Vec<Option<f64>> = retained
        .iter()
        .enumerate()
        .map(|(i, (r, _))| {
            i.checked_sub(1)
                .map(|prev| r.close / retained[prev].0.close - 1.0)
        })
        .collect();

    let strategy_returns: Vec<Option<f64>> = retained
        .iter()
        .zip(&daily_returns)
        .map(|((_, position), daily)| daily.map(|d| position.value() * d))
        .collect();

    let values = compound(initial_capital, &strategy_returns);

    Ok(retained
        .into_iter()
        .zip(daily_returns)
        .zip(strategy_returns)
        .zip(values)
        .map(
            |((((r, position), daily_return), strategy_return), portfolio_value)| {
                PerformanceRecord {
                    timestamp: r.timestamp,
                    close: r.close,
                    position,
                    daily_return,
                    strategy_return,
                    portfolio_value,
                }
            },
        )
        .collect())
}
