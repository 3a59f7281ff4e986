//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! interval = "1min"
//!
//! [strategy]
//! short_window = 50
//! long_window = 200
//!
//! [provider]
//! kind = "alpha_vantage"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crosslab_core::data::{Interval, RetryPolicy};
use crosslab_core::engine::{DEFAULT_INITIAL_CAPITAL, DEFAULT_MIN_USABLE_BARS};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("API key not set: export {var} or add it to .env")]
    MissingApiKey { var: String },
}

/// Everything needed to reproduce a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategySection,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestSection {
    pub symbol: String,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Rows required after warm-up and lag filtering.
    #[serde(default = "default_min_usable_bars")]
    pub min_usable_bars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategySection {
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
        }
    }
}

/// Which data source to fetch from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    AlphaVantage,
    Csv,
    Synthetic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::AlphaVantage => "alpha_vantage",
            ProviderKind::Csv => "csv",
            ProviderKind::Synthetic => "synthetic",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "alpha_vantage" | "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "csv" => Ok(ProviderKind::Csv),
            "synthetic" => Ok(ProviderKind::Synthetic),
            other => Err(format!(
                "unknown provider '{other}'. Valid: alpha_vantage, csv, synthetic"
            )),
        }
    }
}

/// Provider selection plus per-provider settings. Settings for providers other
/// than `kind` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Environment variable holding the Alpha Vantage key.
    pub api_key_env: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub deadline_secs: u64,

    pub csv_path: Option<PathBuf>,

    pub seed: u64,
    pub bars: usize,
    pub start_price: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            kind: ProviderKind::default(),
            api_key_env: "ALPHAVANTAGE_API_KEY".into(),
            base_url: crosslab_core::data::alpha_vantage::DEFAULT_BASE_URL.into(),
            timeout_secs: retry.timeout.as_secs(),
            max_retries: retry.max_retries,
            base_delay_ms: retry.base_delay.as_millis() as u64,
            max_delay_ms: retry.max_delay.as_millis() as u64,
            deadline_secs: retry.deadline.as_secs(),
            csv_path: None,
            seed: 42,
            bars: 2000,
            start_price: 100.0,
        }
    }
}

impl ProviderConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            deadline: Duration::from_secs(self.deadline_secs),
        }
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                var: self.api_key_env.clone(),
            })
    }
}

fn default_initial_capital() -> f64 {
    DEFAULT_INITIAL_CAPITAL
}

fn default_min_usable_bars() -> usize {
    DEFAULT_MIN_USABLE_BARS
}

fn default_short_window() -> usize {
    50
}

fn default_long_window() -> usize {
    200
}

impl BacktestConfig {
    /// Config for `symbol` with every other field at its default.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            backtest: BacktestSection {
                symbol: symbol.into(),
                interval: Interval::default(),
                initial_capital: DEFAULT_INITIAL_CAPITAL,
                min_usable_bars: DEFAULT_MIN_USABLE_BARS,
            },
            strategy: StrategySection::default(),
            provider: ProviderConfig::default(),
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config without validating it, for callers that apply overrides
    /// first and validate afterwards.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse_toml(&content)
    }

    fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every precondition that can be checked before fetching.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidParameter(msg))
        };
        let b = &self.backtest;
        let s = &self.strategy;
        let p = &self.provider;

        if b.symbol.trim().is_empty() {
            return invalid("symbol must not be empty".into());
        }
        if s.short_window == 0 {
            return invalid("short_window must be positive".into());
        }
        if s.long_window <= s.short_window {
            return invalid(format!(
                "long_window ({}) must be greater than short_window ({})",
                s.long_window, s.short_window
            ));
        }
        if !(b.initial_capital.is_finite() && b.initial_capital > 0.0) {
            return invalid(format!(
                "initial_capital must be a positive number, got {}",
                b.initial_capital
            ));
        }
        if b.min_usable_bars == 0 {
            return invalid("min_usable_bars must be positive".into());
        }

        match p.kind {
            ProviderKind::AlphaVantage => {
                if p.api_key_env.trim().is_empty() {
                    return invalid("provider.api_key_env must name an environment variable".into());
                }
                if p.timeout_secs == 0 || p.deadline_secs == 0 {
                    return invalid("provider timeout_secs and deadline_secs must be positive".into());
                }
            }
            ProviderKind::Csv => {
                if p.csv_path.is_none() {
                    return invalid("provider.csv_path is required for the csv provider".into());
                }
            }
            ProviderKind::Synthetic => {
                if p.bars == 0 {
                    return invalid("provider.bars must be positive".into());
                }
                if !(p.start_price.is_finite() && p.start_price > 0.0) {
                    return invalid("provider.start_price must be positive".into());
                }
            }
        }
        Ok(())
    }

    /// Deterministic hash over the full configuration. Two runs with identical
    /// configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
