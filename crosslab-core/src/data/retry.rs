//! Bounded retry with exponential backoff and an overall deadline.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::FetchError;

/// Retry/timeout knobs for a network provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Per-request timeout handed to the HTTP client.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// No new attempt starts once this much time has passed.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            deadline: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Policy with no retries and no waiting; used by offline providers and tests.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, runs out
    /// of retries, or would cross the deadline.
    pub fn run<T, F>(&self, op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Result<T, FetchError>,
    {
        self.run_with_sleep(op, std::thread::sleep)
    }

    /// [`run`](Self::run) with an injectable sleep, so tests don't wait.
    pub fn run_with_sleep<T, F, S>(&self, mut op: F, mut sleep: S) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Result<T, FetchError>,
        S: FnMut(Duration),
    {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            let err = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= self.max_retries {
                warn!(attempts = attempt + 1, error = %err, "giving up after max retries");
                return Err(err);
            }

            attempt += 1;
            let mut delay = self.backoff(attempt);
            if let FetchError::RateLimited { retry_after_secs } = err {
                delay = delay.max(Duration::from_secs(retry_after_secs));
            }

            if started.elapsed() + delay > self.deadline {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    deadline_secs = self.deadline.as_secs(),
                    error = %err,
                    "retry deadline reached"
                );
                return Err(err);
            }

            debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying fetch");
            sleep(delay);
        }
    }
}
