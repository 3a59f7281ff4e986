//! Look-ahead contamination tests.
//!
//! Invariant: no signal or position at bar t may depend on a close from bar
//! t+1 or later, and a position may not depend on the close of its own bar.
//!
//! Method: run the pipeline on a truncated series and on the full series and
//! require identical records over the shared prefix. Then perturb a single
//! close and check that the position on that bar is unchanged.

use chrono::{Duration, NaiveDate};
use crosslab_core::domain::{Bar, Interval, PriceSeries};
use crosslab_core::signals::{map_positions, MovingAverageCrossover};

/// Deterministic pseudo-random walk using a simple LCG.
fn make_closes(n: usize) -> Vec<f64> {
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = (price + change).max(10.0);
            price
        })
        .collect()
}

fn make_series(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::from_close(start + Duration::minutes(i as i64), c))
        .collect();
    PriceSeries::new("TEST", Interval::OneMinute, bars).unwrap()
}

#[test]
fn truncated_prefix_is_identical() {
    let closes = make_closes(400);
    let gen = MovingAverageCrossover::new(10, 50).unwrap();

    let full = map_positions(&gen.generate(&make_series(&closes)));
    for cut in [50, 51, 120, 399] {
        let truncated = map_positions(&gen.generate(&make_series(&closes[..cut])));
        assert_eq!(truncated.len(), cut);
        assert_eq!(&full[..cut], &truncated[..], "prefix of {cut} bars diverged");
    }
}

#[test]
fn position_ignores_same_bar_close() {
    let closes = make_closes(300);
    let gen = MovingAverageCrossover::new(5, 20).unwrap();
    let base = map_positions(&gen.generate(&make_series(&closes)));

    for t in [20, 100, 299] {
        let mut shocked = closes.clone();
        shocked[t] *= 3.0;
        let moved = map_positions(&gen.generate(&make_series(&shocked)));

        assert_eq!(moved[t].position, base[t].position, "position at {t} saw its own close");
        assert_ne!(moved[t].long_ma, base[t].long_ma);
    }
}
