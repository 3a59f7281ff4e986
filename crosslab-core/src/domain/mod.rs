//! Domain types for CrossLab

pub mod bar;
pub mod interval;
pub mod series;

pub use bar::Bar;
pub use interval::Interval;
pub use series::{PriceSeries, SeriesError};
