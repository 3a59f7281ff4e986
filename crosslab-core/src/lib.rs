//! CrossLab Core — price series, data providers, and the backtest engine.
//!
//! This crate contains the pure part of the moving-average crossover backtest:
//! - Domain types (bars, canonical price series)
//! - Data providers (Alpha Vantage, CSV import, synthetic) behind one trait
//! - Trailing simple moving average
//! - Signal generation and the one-bar position lag
//! - Portfolio simulation by compounding strategy returns
//!
//! Every stage after the fetch is a pure function over immutable input:
//! `PriceSeries -> Vec<SignalRecord> -> Vec<SignalRecord> -> Vec<PerformanceRecord>`.

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod signals;

pub use error::BacktestError;
