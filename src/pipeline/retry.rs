// ABOUTME: Bounded retry with exponential backoff for transient remote failures.
// ABOUTME: Sleeps between attempts are capped and interrupted by cancellation.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::error::StepError;
use crate::remote::RemoteError;

/// How often and how patiently to retry an operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay", with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            multiplier: default_multiplier(),
            max_delay: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err("multiplier must be a finite number >= 1.0".to_string());
        }
        if self.max_delay < self.initial_delay {
            return Err("max_delay must not be shorter than initial_delay".to_string());
        }
        Ok(())
    }

    /// Wait after the given number of consecutive failures (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

/// Run `attempt_fn` until it succeeds or `policy.max_attempts` calls failed.
///
/// The closure receives the 1-based attempt number. A `RemoteError::Cancelled`
/// stops retrying at once, as does cancellation during a backoff sleep.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: &'static str,
    mut attempt_fn: F,
) -> Result<T, StepError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(StepError::Cancelled { operation });
        }

        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(RemoteError::Cancelled) => return Err(StepError::Cancelled { operation }),
            Err(last) if attempt >= max_attempts => {
                return Err(StepError::RetriesExhausted {
                    operation,
                    attempts: attempt,
                    last,
                });
            }
            Err(err) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    ?delay,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(StepError::Cancelled { operation }),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}
