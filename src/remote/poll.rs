// ABOUTME: Poll-to-completion loop for long-running remote operations.
// ABOUTME: Honors a polling interval, an overall timeout, and cancellation.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::RemoteError;

/// Interval and deadline for one pollable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PollOptions {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// State of a remote operation as seen by one status query.
#[derive(Debug)]
pub enum OperationStatus<T> {
    InProgress,
    Succeeded(T),
    Failed(RemoteError),
}

/// Query `check` until the operation reaches a terminal state.
///
/// Returns `RemoteError::Timeout` once `options.timeout` elapses without a
/// terminal state, and `RemoteError::Cancelled` as soon as `cancel` fires,
/// including while sleeping between polls.
pub async fn poll_to_completion<T, F, Fut>(
    options: &PollOptions,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<OperationStatus<T>, RemoteError>>,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RemoteError::Cancelled);
        }

        attempt += 1;
        let status = tokio::select! {
            _ = cancel.cancelled() => return Err(RemoteError::Cancelled),
            status = check() => status?,
        };

        match status {
            OperationStatus::Succeeded(value) => return Ok(value),
            OperationStatus::Failed(err) => return Err(err),
            OperationStatus::InProgress => {
                tracing::debug!(attempt, "operation still in progress");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(RemoteError::Timeout(options.timeout));
        }

        let wait = options.interval.min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return Err(RemoteError::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
