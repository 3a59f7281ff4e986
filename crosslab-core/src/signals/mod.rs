//! Signal generation and the one-bar position lag
//!
//! A signal is computed from information available at a bar's close. It only
//! becomes a position on the *next* bar; see [`map_positions`].

pub mod crossover;
pub mod position;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;

pub use crossover::MovingAverageCrossover;
pub use position::map_positions;

/// Directional call for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +1: long exposure.
    Long,
    /// -1: short exposure. Strategy return is the negated bar return.
    Short,
}

impl Direction {
    /// Exposure multiplier applied to the bar return.
    pub fn value(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Per-bar derived fields. Every optional field is `None` while undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub signal: Option<Direction>,
    /// Executable exposure for this bar, filled in by [`map_positions`].
    pub position: Option<Direction>,
}

/// A strategy that classifies every bar of a series.
///
/// Implementations see only the price series, never portfolio state.
pub trait SignalGenerator {
    fn name(&self) -> &str;

    /// Bars at the head of the output whose signal is necessarily undefined.
    fn warmup_bars(&self) -> usize;

    fn generate(&self, series: &PriceSeries) -> Vec<SignalRecord>;
}
