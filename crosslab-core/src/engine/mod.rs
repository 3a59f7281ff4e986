//! Backtest Simulator

pub mod simulator;

pub use simulator::{
    compound, simulate, PerformanceRecord, DEFAULT_INITIAL_CAPITAL, DEFAULT_MIN_USABLE_BARS,
};
