//! Per-source retry with exponential backoff

use crate::error::FeedError;
use crate::Result;
use config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (0-based): `base * multiplier^retry`, capped
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry as i32);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        if capped.is_finite() && capped > 0.0 {
            Duration::from_millis(capped as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_attempt()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            multiplier: cfg.multiplier,
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// `op` receives the 1-based attempt number. Errors that are not
/// [retryable](FeedError::is_retryable) are returned as-is without another
/// attempt. Exhaustion yields [`FeedError::UpstreamUnavailable`] carrying the
/// last error's message.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, source_name: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err: Option<FeedError> = None;

    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                debug!(source = source_name, attempt, error = %e, "Not retryable");
                return Err(e);
            }
            Err(e) => {
                if attempt < attempts {
                    let delay = policy.delay_for(attempt - 1);
                    warn!(
                        source = source_name,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    debug!(source = source_name, attempt, error = %e, "Final attempt failed");
                }
                last_err = Some(e);
            }
        }
    }

    Err(FeedError::UpstreamUnavailable {
        source_name: source_name.to_string(),
        attempts,
        message: last_err.map(|e| e.to_string()).unwrap_or_default(),
    })
}
