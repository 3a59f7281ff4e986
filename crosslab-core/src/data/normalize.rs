//! Column-name and timestamp normalization, plus canonicalization of raw bars
//! into a [`PriceSeries`].

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use super::FetchError;
use crate::domain::{Bar, Interval, PriceSeries};

/// Canonical columns a provider must map its fields onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    /// Map a raw provider field name onto a canonical column.
    ///
    /// Strips a leading `"<digits>. "` prefix (Alpha Vantage's `"1. open"`),
    /// trims, and matches case-insensitively.
    pub fn from_name(raw: &str) -> Option<Column> {
        let trimmed = raw.trim();
        let name = match trimmed.split_once(". ") {
            Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
                rest.trim()
            }
            _ => trimmed,
        };

        match name.to_ascii_lowercase().as_str() {
            "timestamp" | "time" | "date" | "datetime" => Some(Column::Timestamp),
            "open" => Some(Column::Open),
            "high" => Some(Column::High),
            "low" => Some(Column::Low),
            "close" => Some(Column::Close),
            "volume" => Some(Column::Volume),
            _ => None,
        }
    }
}

/// Positions of the canonical columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub timestamp: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
}

impl ColumnMap {
    /// Resolve a header row. Unknown columns are ignored; the first match for
    /// each canonical column wins.
    pub fn from_headers<'a, I>(headers: I) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut slots: [Option<usize>; 6] = [None; 6];
        for (idx, name) in headers.into_iter().enumerate() {
            if let Some(col) = Column::from_name(name) {
                let slot = &mut slots[col as usize];
                if slot.is_none() {
                    *slot = Some(idx);
                }
            }
        }

        let need = |col: Column| {
            slots[col as usize]
                .ok_or_else(|| FetchError::MalformedResponse(format!("missing {col:?} column")))
        };

        Ok(Self {
            timestamp: need(Column::Timestamp)?,
            open: need(Column::Open)?,
            high: need(Column::High)?,
            low: need(Column::Low)?,
            close: need(Column::Close)?,
            volume: need(Column::Volume)?,
        })
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a provider timestamp. Date-only values land at midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, FetchError> {
    let s = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| FetchError::MalformedResponse(format!("unparseable timestamp '{raw}'")))
}

/// Parse a numeric field, mapping failure to `MalformedResponse`.
pub(crate) fn parse_value(raw: &str, field: &str) -> Result<f64, FetchError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FetchError::MalformedResponse(format!("bad {field} value '{raw}'")))
}

/// Sort, dedupe, and validate raw bars into a canonical series.
///
/// Duplicate timestamps keep the first occurrence in input order. Any
/// non-finite or negative value rejects the whole batch; an empty batch is
/// `NotFound`.
pub fn canonicalize(
    symbol: &str,
    interval: Interval,
    mut bars: Vec<Bar>,
) -> Result<PriceSeries, FetchError> {
    if bars.is_empty() {
        return Err(FetchError::NotFound {
            symbol: symbol.to_string(),
        });
    }

    if let Some(bad) = bars.iter().find(|b| !b.is_valid()) {
        return Err(FetchError::MalformedResponse(format!(
            "negative or non-finite value in bar at {}",
            bad.timestamp
        )));
    }

    // Stable sort keeps input order among equal timestamps.
    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let dropped = before - bars.len();
    if dropped > 0 {
        warn!(symbol, dropped, "dropped duplicate timestamps");
    }

    PriceSeries::new(symbol, interval, bars)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))
}
