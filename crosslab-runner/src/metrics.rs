//! Performance metrics over the simulated records.
//!
//! Every metric is a pure function: performance records in, scalar out. The
//! 252 annualization constant is applied regardless of bar interval.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crosslab_core::engine::PerformanceRecord;

/// Periods per year used for annualization, whatever the bar interval.
pub const ANNUALIZATION_FACTOR: f64 = 252.0;

/// Volatility below this magnitude is floating-point residue of a constant
/// return series and is treated as zero.
const ZERO_VOLATILITY_EPSILON: f64 = 1e-12;

/// Why metrics could not be produced. Callers decide whether to skip the
/// report or warn; no placeholder numbers are ever substituted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("no performance records to evaluate")]
    Empty,

    #[error(
        "metrics undefined (total_return={total_return}, annualized_return={annualized_return}, sharpe_ratio={sharpe_ratio})"
    )]
    Undefined {
        total_return: f64,
        annualized_return: f64,
        sharpe_ratio: f64,
    },
}

/// Summary statistics for one backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub bar_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(records: &[PerformanceRecord]) -> Result<Self, MetricsError> {
        let (first, last) = match (records.first(), records.last()) {
            (Some(f), Some(l)) => (f.portfolio_value, l.portfolio_value),
            _ => return Err(MetricsError::Empty),
        };

        let n = records.len();
        let strategy_returns: Vec<f64> = records.iter().filter_map(|r| r.strategy_return).collect();

        let total = total_return(first, last);
        let annualized = annualized_return(total, n);
        let vol = volatility(&strategy_returns);
        let sharpe = sharpe_ratio(annualized, vol);

        if total.is_nan() || annualized.is_nan() || sharpe.is_nan() {
            return Err(MetricsError::Undefined {
                total_return: total,
                annualized_return: annualized,
                sharpe_ratio: sharpe,
            });
        }

        Ok(Self {
            total_return: total,
            annualized_return: annualized,
            volatility: vol,
            sharpe_ratio: sharpe,
            bar_count: n,
        })
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// `last / first - 1`.
pub fn total_return(first_value: f64, last_value: f64) -> f64 {
    last_value / first_value - 1.0
}

/// `(1 + total)^(252 / n) - 1`. NaN when `n == 0` or the base is negative.
pub fn annualized_return(total_return: f64, n: usize) -> f64 {
    if n == 0 {
        return f64::NAN;
    }
    (1.0 + total_return).powf(ANNUALIZATION_FACTOR / n as f64) - 1.0
}

/// Sample standard deviation of `returns`, scaled by `sqrt(252)`.
///
/// NaN with fewer than two returns (sample deviation is undefined); exactly
/// zero when the deviation is within rounding of zero.
pub fn volatility(returns: &[f64]) -> f64 {
    let vol = std_dev(returns) * ANNUALIZATION_FACTOR.sqrt();
    if vol.abs() < ZERO_VOLATILITY_EPSILON {
        0.0
    } else {
        vol
    }
}

/// `annualized / volatility`, or 0 when volatility is zero. Risk-free rate is
/// taken as zero.
pub fn sharpe_ratio(annualized_return: f64, volatility: f64) -> f64 {
    if volatility == 0.0 {
        0.0
    } else {
        annualized_return / volatility
    }
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use crosslab_core::signals::Direction;

    fn records(values: &[f64]) -> Vec<PerformanceRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| PerformanceRecord {
                timestamp: start + Duration::days(i as i64),
                close: v,
                position: Direction::Long,
                daily_return: (i > 0).then(|| v / values[i - 1] - 1.0),
                strategy_return: (i > 0).then(|| v / values[i - 1] - 1.0),
                portfolio_value: v,
            })
            .collect()
    }

    #[test]
    fn total_and_annualized_return() {
        let recs = records(&[100.0, 110.0, 121.0]);
        let m = PerformanceMetrics::compute(&recs).unwrap();
        assert!((m.total_return - 0.21).abs() < 1e-12);
        let expected = 1.21_f64.powf(252.0 / 3.0) - 1.0;
        assert!((m.annualized_return - expected).abs() / expected < 1e-12);
        assert_eq!(m.bar_count, 3);
    }

    #[test]
    fn constant_nonzero_return_has_zero_sharpe() {
        let values: Vec<f64> = (0..300).map(|i| 100.0 * 1.001_f64.powi(i)).collect();
        let m = PerformanceMetrics::compute(&records(&values)).unwrap();
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert!(m.total_return > 0.0);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        // returns +10% then -10%: mean 0, sample var = (0.01 + 0.01) / 1
        let recs = records(&[100.0, 110.0, 99.0]);
        let m = PerformanceMetrics::compute(&recs).unwrap();
        let expected = (0.02_f64).sqrt() * 252.0_f64.sqrt();
        assert!((m.volatility - expected).abs() < 1e-12);
        assert!((m.sharpe_ratio - m.annualized_return / expected).abs() < 1e-9);
    }

    #[test]
    fn empty_is_error() {
        assert_eq!(PerformanceMetrics::compute(&[]), Err(MetricsError::Empty));
    }

    #[test]
    fn single_record_is_undefined() {
        let err = PerformanceMetrics::compute(&records(&[100.0])).unwrap_err();
        match err {
            MetricsError::Undefined {
                total_return,
                sharpe_ratio,
                ..
            } => {
                assert_eq!(total_return, 0.0);
                assert!(sharpe_ratio.is_nan());
            }
            other => panic!("expected Undefined, got {other:?}"),
        }
    }

    #[test]
    fn negative_portfolio_is_undefined() {
        // 252 / 5 is fractional, so a negative growth base has no real power
        let mut recs = records(&[100.0, 80.0, 60.0, 40.0, 20.0]);
        recs[4].portfolio_value = -10.0;
        recs[4].strategy_return = Some(-1.5);
        assert!(matches!(
            PerformanceMetrics::compute(&recs),
            Err(MetricsError::Undefined { .. })
        ));
    }

    #[test]
    fn sharpe_zero_when_vol_zero() {
        assert_eq!(sharpe_ratio(0.5, 0.0), 0.0);
        assert_eq!(sharpe_ratio(0.5, 0.25), 2.0);
    }

    #[test]
    fn annualized_zero_bars_is_nan() {
        assert!(annualized_return(0.1, 0).is_nan());
    }
}
