//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One OHLCV observation at a timestamp.
///
/// Bars are immutable once fetched. Prices and volume are non-negative reals;
/// [`crate::domain::PriceSeries::new`] rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Flat bar at a single price; handy for close-only sources and tests.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        Self::new(timestamp, close, close, close, close, 0.0)
    }

    /// Returns true if every OHLCV field is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn bar_is_valid() {
        let bar = Bar::new(ts(), 100.0, 105.0, 98.0, 103.0, 50_000.0);
        assert!(bar.is_valid());
    }

    #[test]
    fn bar_rejects_nan() {
        let mut bar = Bar::from_close(ts(), 100.0);
        bar.close = f64::NAN;
        assert!(!bar.is_valid());
    }

    #[test]
    fn bar_rejects_negative() {
        let mut bar = Bar::from_close(ts(), 100.0);
        bar.volume = -1.0;
        assert!(!bar.is_valid());
    }

    #[test]
    fn zero_prices_are_allowed() {
        assert!(Bar::from_close(ts(), 0.0).is_valid());
    }
}
