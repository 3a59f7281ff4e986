//! Series loading for the runner.
//!
//! Builds the provider named in the config, fetches one symbol, and
//! fingerprints the result. Synthetic data is a developer-only mode; results
//! produced on it are tagged.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crosslab_core::data::{
    AlphaVantageProvider, CircuitBreaker, CsvProvider, DataProvider, FetchError, SyntheticProvider,
};
use crosslab_core::domain::PriceSeries;

use crate::config::{BacktestConfig, ConfigError, ProviderKind};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("provider setup failed: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch from {provider} failed: {source}")]
    Fetch {
        provider: String,
        #[source]
        source: FetchError,
    },
}

impl LoadError {
    /// The underlying fetch error, if the provider itself failed.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            LoadError::Fetch { source, .. } => Some(source),
            LoadError::Config(_) => None,
        }
    }
}

/// A fetched series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub series: PriceSeries,
    pub provider: String,
    /// BLAKE3 over symbol, interval, and every bar.
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// Construct the provider selected by `config.provider.kind`.
///
/// Alpha Vantage reads its key from the configured environment variable here,
/// so a missing key fails before any request.
pub fn build_provider(config: &BacktestConfig) -> Result<Box<dyn DataProvider>, LoadError> {
    let p = &config.provider;
    let provider: Box<dyn DataProvider> = match p.kind {
        ProviderKind::AlphaVantage => {
            let provider = AlphaVantageProvider::new(
                p.api_key()?,
                p.base_url.clone(),
                p.retry_policy(),
                Arc::new(CircuitBreaker::default_provider()),
            )
            .map_err(|source| LoadError::Fetch {
                provider: ProviderKind::AlphaVantage.as_str().into(),
                source,
            })?;
            Box::new(provider)
        }
        ProviderKind::Csv => {
            let path = p.csv_path.clone().ok_or_else(|| {
                ConfigError::InvalidParameter("provider.csv_path is required for the csv provider".into())
            })?;
            Box::new(CsvProvider::new(path))
        }
        ProviderKind::Synthetic => Box::new(SyntheticProvider::new(p.seed, p.bars, p.start_price)),
    };
    Ok(provider)
}

/// Fetch the configured symbol with the configured provider.
pub fn load_series(config: &BacktestConfig) -> Result<LoadedData, LoadError> {
    let provider = build_provider(config)?;
    load_with(provider.as_ref(), config)
}

/// Fetch with an explicit provider (tests, alternative front ends).
pub fn load_with(provider: &dyn DataProvider, config: &BacktestConfig) -> Result<LoadedData, LoadError> {
    let symbol = config.backtest.symbol.as_str();
    let interval = config.backtest.interval;

    let series = provider
        .fetch(symbol, interval)
        .map_err(|source| LoadError::Fetch {
            provider: provider.name().to_string(),
            source,
        })?;

    let dataset_hash = compute_dataset_hash(&series);
    let synthetic = provider.name() == "synthetic";
    info!(
        symbol,
        %interval,
        provider = provider.name(),
        bars = series.len(),
        synthetic,
        "loaded series"
    );

    Ok(LoadedData {
        series,
        provider: provider.name().to_string(),
        dataset_hash,
        synthetic,
    })
}

/// Deterministic fingerprint of a series.
pub fn compute_dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());
    hasher.update(series.interval().as_str().as_bytes());
    for bar in series.bars() {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
