//! Property tests for the runner's metrics.
//!
//! Uses proptest to verify:
//! - Returns, volatility and Sharpe do not depend on the starting capital
//! - The portfolio curve scales linearly with the starting capital
//! - Identical inputs give identical results

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use crosslab_core::domain::{Bar, Interval, PriceSeries};
use crosslab_runner::{run_backtest_from_series, BacktestConfig};

fn daily_series(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::from_close(start + Duration::days(i as i64), c))
        .collect();
    PriceSeries::new("PROP", Interval::Daily, bars).unwrap()
}

fn config(capital: f64) -> BacktestConfig {
    let mut cfg = BacktestConfig::for_symbol("PROP");
    cfg.backtest.interval = Interval::Daily;
    cfg.backtest.initial_capital = capital;
    cfg.backtest.min_usable_bars = 20;
    cfg.strategy.short_window = 3;
    cfg.strategy.long_window = 10;
    cfg
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk kept well away from zero so the portfolio stays positive.
fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.02..0.02_f64, 40..200).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|r| {
                price *= 1.0 + r;
                price
            })
            .collect()
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ── Capital invariance ───────────────────────────────────────────────

proptest! {
    #[test]
    fn metrics_ignore_initial_capital(closes in arb_closes(), scale in 0.01..1_000.0_f64) {
        let series = daily_series(&closes);
        let base = run_backtest_from_series(&config(10_000.0), &series).unwrap();
        let scaled = run_backtest_from_series(&config(10_000.0 * scale), &series).unwrap();

        let a = base.metrics.unwrap();
        let b = scaled.metrics.unwrap();
        prop_assert!(close(a.total_return, b.total_return), "{} vs {}", a.total_return, b.total_return);
        prop_assert!(close(a.annualized_return, b.annualized_return));
        prop_assert!(close(a.volatility, b.volatility));
        prop_assert!(close(a.sharpe_ratio, b.sharpe_ratio));
        prop_assert_eq!(a.bar_count, b.bar_count);
    }

    #[test]
    fn portfolio_scales_with_capital(closes in arb_closes(), scale in 0.01..1_000.0_f64) {
        let series = daily_series(&closes);
        let base = run_backtest_from_series(&config(10_000.0), &series).unwrap();
        let scaled = run_backtest_from_series(&config(10_000.0 * scale), &series).unwrap();

        prop_assert_eq!(base.performance.len(), scaled.performance.len());
        for (p, q) in base.performance.iter().zip(&scaled.performance) {
            prop_assert!(close(p.portfolio_value * scale, q.portfolio_value));
            prop_assert_eq!(p.position, q.position);
        }
    }

    #[test]
    fn runs_are_deterministic(closes in arb_closes()) {
        let series = daily_series(&closes);
        let a = run_backtest_from_series(&config(10_000.0), &series).unwrap();
        let b = run_backtest_from_series(&config(10_000.0), &series).unwrap();
        prop_assert_eq!(a, b);
    }
}
