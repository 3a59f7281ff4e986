//! Dual moving-average crossover.
//!
//! - Long when the short MA is strictly above the long MA
//! - Short otherwise (ties go short)
//! - Undefined until both averages are defined

use tracing::debug;

use super::{Direction, SignalGenerator, SignalRecord};
use crate::domain::PriceSeries;
use crate::error::BacktestError;
use crate::indicators::sma;

/// Moving-average crossover signal.
///
/// # Parameters
/// - `short_window`: fast MA period, > 0
/// - `long_window`: slow MA period, > `short_window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageCrossover {
    short_window: usize,
    long_window: usize,
}

impl MovingAverageCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, BacktestError> {
        if short_window == 0 || long_window == 0 {
            return Err(BacktestError::InvalidParameter(format!(
                "window sizes must be positive (short={short_window}, long={long_window})"
            )));
        }
        if short_window >= long_window {
            return Err(BacktestError::InvalidParameter(format!(
                "short window ({short_window}) must be less than long window ({long_window})"
            )));
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    /// Signals for every bar. `position` is left `None`.
    pub fn generate(&self, series: &PriceSeries) -> Vec<SignalRecord> {
        let closes = series.closes();
        let short = sma(&closes, self.short_window);
        let long = sma(&closes, self.long_window);

        let records: Vec<SignalRecord> = series
            .bars()
            .iter()
            .zip(short)
            .zip(long)
            .map(|((bar, short_ma), long_ma)| SignalRecord {
                timestamp: bar.timestamp,
                close: bar.close,
                short_ma,
                long_ma,
                signal: classify(short_ma, long_ma),
                position: None,
            })
            .collect();

        debug!(
            bars = records.len(),
            defined = records.iter().filter(|r| r.signal.is_some()).count(),
            short = self.short_window,
            long = self.long_window,
            "generated crossover signals"
        );
        records
    }
}

fn classify(short_ma: Option<f64>, long_ma: Option<f64>) -> Option<Direction> {
    match (short_ma, long_ma) {
        (Some(s), Some(l)) if s > l => Some(Direction::Long),
        (Some(_), Some(_)) => Some(Direction::Short),
        _ => None,
    }
}

impl SignalGenerator for MovingAverageCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.long_window - 1
    }

    fn generate(&self, series: &PriceSeries) -> Vec<SignalRecord> {
        MovingAverageCrossover::generate(self, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Interval};
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::from_close(start + Duration::days(i as i64), c))
            .collect();
        PriceSeries::new("TEST", Interval::Daily, bars).unwrap()
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(matches!(
            MovingAverageCrossover::new(0, 5),
            Err(BacktestError::InvalidParameter(_))
        ));
        assert!(matches!(
            MovingAverageCrossover::new(5, 5),
            Err(BacktestError::InvalidParameter(_))
        ));
        assert!(matches!(
            MovingAverageCrossover::new(10, 5),
            Err(BacktestError::InvalidParameter(_))
        ));
        assert!(MovingAverageCrossover::new(1, 2).is_ok());
    }

    #[test]
    fn bullish_when_short_above_long() {
        let gen = MovingAverageCrossover::new(2, 3).unwrap();
        let records = gen.generate(&series(&[100.0, 101.0, 102.0, 105.0]));
        assert_eq!(records[0].signal, None);
        assert_eq!(records[1].signal, None);
        assert_eq!(records[2].signal, Some(Direction::Long));
        assert_eq!(records[3].signal, Some(Direction::Long));
    }

    #[test]
    fn bearish_when_short_below_long() {
        let gen = MovingAverageCrossover::new(2, 3).unwrap();
        let records = gen.generate(&series(&[105.0, 104.0, 103.0, 100.0]));
        assert_eq!(records[3].signal, Some(Direction::Short));
    }

    #[test]
    fn short_ma_defined_before_long_ma() {
        let gen = MovingAverageCrossover::new(2, 4).unwrap();
        let records = gen.generate(&series(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(records[1].short_ma, Some(1.5));
        assert_eq!(records[1].long_ma, None);
        assert_eq!(records[1].signal, None);
        assert_eq!(records[3].long_ma, Some(2.5));
    }

    #[test]
    fn positions_left_unset() {
        let gen = MovingAverageCrossover::new(2, 3).unwrap();
        let records = gen.generate(&series(&[1.0, 2.0, 3.0, 4.0]));
        assert!(records.iter().all(|r| r.position.is_none()));
    }

    #[test]
    fn warmup_and_name() {
        let gen = MovingAverageCrossover::new(20, 50).unwrap();
        assert_eq!(SignalGenerator::warmup_bars(&gen), 49);
        assert_eq!(SignalGenerator::name(&gen), "ma_crossover");
    }

    #[test]
    fn trait_object_matches_inherent() {
        let gen = MovingAverageCrossover::new(3, 5).unwrap();
        let s = series(&[5.0, 4.0, 6.0, 7.0, 3.0, 8.0, 9.0]);
        let dyn_gen: &dyn SignalGenerator = &gen;
        assert_eq!(dyn_gen.generate(&s), gen.generate(&s));
    }
}
