//! Seeded random-walk provider for demos and tests. Never touches the network.

use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::normalize::canonicalize;
use super::provider::{DataProvider, FetchError};
use crate::domain::{Bar, Interval, PriceSeries};

/// Generates `bars` bars of a multiplicative random walk. The same seed, bar
/// count, and start price always yield the same series.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProvider {
    pub seed: u64,
    pub bars: usize,
    pub start_price: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64, bars: usize, start_price: f64) -> Self {
        Self {
            seed,
            bars,
            start_price,
        }
    }

    fn start_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap_or_default()
    }

    /// Raw bars, before canonicalization.
    pub fn generate(&self, interval: Interval) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = interval.duration();
        let mut ts = Self::start_timestamp();
        let mut price = self.start_price;
        let mut out = Vec::with_capacity(self.bars);

        for _ in 0..self.bars {
            let ret: f64 = rng.gen_range(-0.02..0.02);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
            let volume = rng.gen_range(1_000..100_000u64) as f64;

            out.push(Bar::new(ts, open, high, low, close, volume));
            price = close;
            ts += step;
        }
        out
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, interval: Interval) -> Result<PriceSeries, FetchError> {
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(FetchError::MalformedResponse(format!(
                "synthetic start price must be positive, got {}",
                self.start_price
            )));
        }
        canonicalize(symbol, interval, self.generate(interval))
    }

    fn is_available(&self) -> bool {
        true
    }
}
