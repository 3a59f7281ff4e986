//! CSV file provider for offline runs.
//!
//! The file holds one symbol; the caller supplies the symbol and interval.
//! Column headers may use any naming
//! [`Column::from_name`](super::normalize::Column::from_name) understands.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::normalize::{canonicalize, parse_timestamp, parse_value, ColumnMap};
use super::provider::{DataProvider, FetchError};
use crate::domain::{Bar, Interval, PriceSeries};

#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, interval: Interval) -> Result<PriceSeries, FetchError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| FetchError::Io(format!("{}: {e}", self.path.display())))?;

        let headers = reader
            .headers()
            .map_err(|e| FetchError::MalformedResponse(format!("bad CSV header: {e}")))?
            .clone();
        let map = ColumnMap::from_headers(headers.iter())?;

        let mut bars = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| FetchError::MalformedResponse(format!("row {}: {e}", line + 2)))?;
            let field = |idx: usize| {
                record.get(idx).ok_or_else(|| {
                    FetchError::MalformedResponse(format!("row {} is missing a field", line + 2))
                })
            };

            bars.push(Bar::new(
                parse_timestamp(field(map.timestamp)?)?,
                parse_value(field(map.open)?, "open")?,
                parse_value(field(map.high)?, "high")?,
                parse_value(field(map.low)?, "low")?,
                parse_value(field(map.close)?, "close")?,
                parse_value(field(map.volume)?, "volume")?,
            ));
        }

        debug!(path = %self.path.display(), rows = bars.len(), "read CSV");
        canonicalize(symbol, interval, bars)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}
