//! Alpha Vantage data provider.
//!
//! Fetches intraday (`TIME_SERIES_INTRADAY`) or daily (`TIME_SERIES_DAILY`)
//! bars over blocking HTTP, with retries, a deadline, and a circuit breaker.
//! The API answers throttling and bad symbols with HTTP 200 and a JSON note,
//! so the body is inspected before the bars are parsed.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::circuit_breaker::CircuitBreaker;
use super::normalize::{canonicalize, parse_timestamp, parse_value, Column};
use super::provider::{DataProvider, FetchError};
use super::retry::RetryPolicy;
use crate::domain::{Bar, Interval, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Seconds to wait when the API throttles us without a hint. The free tier
/// limit is per minute.
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl AlphaVantageProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(retry.timeout)
            .user_agent(concat!("crosslab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry,
            circuit_breaker,
        })
    }

    /// Build the query URL for a symbol and interval.
    pub fn query_url(&self, symbol: &str, interval: Interval) -> Result<reqwest::Url, FetchError> {
        let endpoint = format!("{}/query", self.base_url);
        let function = if interval.is_intraday() {
            "TIME_SERIES_INTRADAY"
        } else {
            "TIME_SERIES_DAILY"
        };
        let mut params = vec![("function", function), ("symbol", symbol)];
        if interval.is_intraday() {
            params.push(("interval", interval.as_str()));
        }
        params.push(("outputsize", "full"));
        params.push(("apikey", self.api_key.as_str()));

        reqwest::Url::parse_with_params(&endpoint, &params)
            .map_err(|e| FetchError::Network(format!("invalid base url '{}': {e}", self.base_url)))
    }

    fn fetch_once(
        &self,
        url: &reqwest::Url,
        symbol: &str,
        interval: Interval,
    ) -> Result<PriceSeries, FetchError> {
        let resp = self.client.get(url.clone()).send().map_err(|e| self.classify(e))?;
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after_secs(resp.headers()),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status} for {symbol}")));
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::MalformedResponse(format!("unreadable body for {symbol}: {e}")))?;
        parse_response(symbol, interval, &body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                elapsed_secs: self.retry.timeout.as_secs(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(&self, symbol: &str, interval: Interval) -> Result<PriceSeries, FetchError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(FetchError::CircuitOpen);
        }

        let url = self.query_url(symbol, interval)?;
        debug!(symbol, %interval, "requesting Alpha Vantage series");

        let result = self.retry.run(|attempt| {
            let outcome = self.fetch_once(&url, symbol, interval);
            if let Err(e) = &outcome {
                debug!(attempt, error = %e, "attempt failed");
            }
            outcome
        });

        // One breaker failure per exhausted fetch, not per attempt, so the
        // caller always sees the error that ended the retry loop.
        match &result {
            Ok(series) => {
                self.circuit_breaker.record_success();
                info!(symbol, %interval, bars = series.len(), "fetched series");
            }
            Err(e) if e.is_retryable() => self.circuit_breaker.record_failure(),
            Err(_) => {}
        }
        result
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Parse an Alpha Vantage JSON body into a canonical series.
pub fn parse_response(
    symbol: &str,
    interval: Interval,
    body: &str,
) -> Result<PriceSeries, FetchError> {
    let root: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON for {symbol}: {e}")))?;

    if let Some(message) = root.get("Error Message") {
        let message = message.as_str().unwrap_or_default();
        if mentions_access_problem(message) {
            return Err(FetchError::AccessDenied(message.to_string()));
        }
        return Err(FetchError::NotFound {
            symbol: symbol.to_string(),
        });
    }
    for key in ["Information", "Note"] {
        if let Some(message) = root.get(key) {
            let message = message.as_str().unwrap_or_default();
            if mentions_access_problem(message) {
                return Err(FetchError::AccessDenied(message.to_string()));
            }
            return Err(FetchError::RateLimited {
                retry_after_secs: DEFAULT_RATE_LIMIT_WAIT_SECS,
            });
        }
    }

    let series = root
        .iter()
        .find(|(k, _)| k.starts_with("Time Series"))
        .and_then(|(_, v)| v.as_object())
        .ok_or_else(|| FetchError::MalformedResponse(format!("no time series in response for {symbol}")))?;

    let bars = series
        .iter()
        .map(|(stamp, fields)| parse_bar(stamp, fields))
        .collect::<Result<Vec<_>, _>>()?;

    canonicalize(symbol, interval, bars)
}

/// Alpha Vantage reports key and plan problems in the same fields it uses for
/// throttling. Throttle notices also mention the key and premium plans, so the
/// rate-limit wording is checked first.
fn mentions_access_problem(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    let throttled = ["rate limit", "call frequency", "requests per"]
        .iter()
        .any(|needle| lower.contains(needle));
    !throttled
        && ["premium endpoint", "apikey", "api key"]
            .iter()
            .any(|needle| lower.contains(needle))
}

/// Seconds from a `Retry-After` header, falling back to the per-minute default.
/// Only the delta-seconds form is understood.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS)
}

fn parse_bar(stamp: &str, fields: &Value) -> Result<Bar, FetchError> {
    let fields = fields
        .as_object()
        .ok_or_else(|| FetchError::MalformedResponse(format!("bar at {stamp} is not an object")))?;

    let mut values: [Option<f64>; 6] = [None; 6];
    for (name, raw) in fields {
        let Some(col) = Column::from_name(name) else {
            continue;
        };
        let value = match raw {
            Value::String(s) => parse_value(s, name)?,
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| FetchError::MalformedResponse(format!("bad {name} value at {stamp}")))?,
            _ => return Err(FetchError::MalformedResponse(format!("bad {name} value at {stamp}"))),
        };
        values[col as usize] = Some(value);
    }

    let get = |col: Column| {
        values[col as usize]
            .ok_or_else(|| FetchError::MalformedResponse(format!("bar at {stamp} missing {col:?}")))
    };

    Ok(Bar::new(
        parse_timestamp(stamp)?,
        get(Column::Open)?,
        get(Column::High)?,
        get(Column::Low)?,
        get(Column::Close)?,
        get(Column::Volume)?,
    ))
}

/// Convenience constructor with the default policy and breaker.
pub fn default_provider(api_key: impl Into<String>) -> Result<AlphaVantageProvider, FetchError> {
    AlphaVantageProvider::new(
        api_key,
        DEFAULT_BASE_URL,
        RetryPolicy::default(),
        Arc::new(CircuitBreaker::default_provider()),
    )
}
