//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! - Moving-average warm-up length and trailing-mean values
//! - Position at bar t equals signal at bar t-1
//! - Flat prices tie to Short everywhere
//! - Constant strategy return compounds geometrically

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use crosslab_core::domain::{Bar, Interval, PriceSeries};
use crosslab_core::engine::{compound, simulate};
use crosslab_core::indicators::sma;
use crosslab_core::signals::{map_positions, Direction, MovingAverageCrossover, SignalRecord};

fn make_series(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
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

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 1..max_len)
}

fn arb_windows() -> impl Strategy<Value = (usize, usize)> {
    (1usize..20).prop_flat_map(|short| (Just(short), (short + 1)..40))
}

// ── Moving-average warm-up ────────────────────────────────────────

proptest! {
    /// Undefined for exactly the first W-1 bars, then the trailing mean.
    #[test]
    fn sma_warmup_and_value(closes in arb_closes(120), window in 1usize..30) {
        let out = sma(&closes, window);
        prop_assert_eq!(out.len(), closes.len());

        for (i, value) in out.iter().enumerate() {
            if i + 1 < window {
                prop_assert!(value.is_none(), "bar {} should be warm-up", i);
            } else {
                let slice = &closes[i + 1 - window..=i];
                let mean = slice.iter().sum::<f64>() / window as f64;
                let got = value.expect("defined after warm-up");
                prop_assert!((got - mean).abs() <= 1e-9 * mean.abs().max(1.0),
                    "bar {}: got {}, expected {}", i, got, mean);
            }
        }
    }

    /// Signal is defined exactly where the long MA is.
    #[test]
    fn signal_defined_after_long_warmup(closes in arb_closes(120), (short, long) in arb_windows()) {
        let gen = MovingAverageCrossover::new(short, long).unwrap();
        let records = gen.generate(&make_series(&closes));
        for (i, r) in records.iter().enumerate() {
            prop_assert_eq!(r.signal.is_some(), i + 1 >= long);
            prop_assert_eq!(r.long_ma.is_some(), i + 1 >= long);
            prop_assert_eq!(r.short_ma.is_some(), i + 1 >= short);
        }
    }
}

// ── One-bar lag ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn position_is_previous_signal(closes in arb_closes(150), (short, long) in arb_windows()) {
        let gen = MovingAverageCrossover::new(short, long).unwrap();
        let signals = gen.generate(&make_series(&closes));
        let positioned = map_positions(&signals);

        prop_assert_eq!(positioned.len(), signals.len());
        prop_assert_eq!(positioned[0].position, None);
        for t in 1..positioned.len() {
            prop_assert_eq!(positioned[t].position, signals[t - 1].signal);
            prop_assert_eq!(positioned[t].signal, signals[t].signal);
        }
    }
}

// ── Flat-price tie-break ──────────────────────────────────────────

proptest! {
    /// ShortMA == LongMA everywhere, so every defined signal is Short.
    #[test]
    fn flat_prices_signal_short(price in 0.01..10_000.0_f64, len in 1usize..200, (short, long) in arb_windows()) {
        let gen = MovingAverageCrossover::new(short, long).unwrap();
        let records = gen.generate(&make_series(&vec![price; len]));
        for r in records.iter().filter(|r| r.signal.is_some()) {
            prop_assert_eq!(r.short_ma, r.long_ma);
            prop_assert_eq!(r.signal, Some(Direction::Short));
        }
    }
}

// ── Compounding ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn constant_return_compounds(r in -0.05..0.05_f64, n in 1usize..300, capital in 1.0..1e6_f64) {
        let mut returns = vec![Some(r); n];
        returns[0] = None;
        let values = compound(capital, &returns);
        for (t, v) in values.iter().enumerate() {
            let expected = capital * (1.0 + r).powi(t as i32);
            prop_assert!((v - expected).abs() <= 1e-9 * expected.abs().max(1.0),
                "t={}: {} vs {}", t, v, expected);
        }
    }

    /// Geometric closes with a fixed Long position give a constant strategy return.
    #[test]
    fn simulated_constant_growth(g in -0.01..0.01_f64, n in 2usize..200) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let records: Vec<SignalRecord> = (0..n)
            .map(|i| {
                let close = 100.0 * (1.0 + g).powi(i as i32);
                SignalRecord {
                    timestamp: start + Duration::days(i as i64),
                    close,
                    short_ma: Some(close),
                    long_ma: Some(close),
                    signal: Some(Direction::Long),
                    position: Some(Direction::Long),
                }
            })
            .collect();

        let perf = simulate(&records, 10_000.0, 1).unwrap();
        for (t, p) in perf.iter().enumerate() {
            let expected = 10_000.0 * (1.0 + g).powi(t as i32);
            prop_assert!((p.portfolio_value - expected).abs() <= 1e-6 * expected,
                "t={}: {} vs {}", t, p.portfolio_value, expected);
        }
    }
}
