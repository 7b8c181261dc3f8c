//! Bounded retries with linear backoff around a price source

use crate::error::{Result, SourceError};
use crate::source::PriceSource;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::warn;
use var_backtest::PriceSeries;

/// Retry settings for data retrieval
///
/// Attempt `k` (1-based) that fails with a retryable error is followed by a
/// sleep of `k * backoff_ms` before the next attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2000,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Fetch from `source`, retrying transient failures
    pub fn fetch(&self, source: &dyn PriceSource) -> Result<PriceSeries> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match source.fetch() {
                Ok(prices) => return Ok(prices),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        max_attempts,
                        source.name(),
                        err,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(SourceError::Exhausted {
                        name: source.name(),
                        attempts: attempt,
                        last: Box::new(err),
                    })
                }
            }
        }
    }
}
