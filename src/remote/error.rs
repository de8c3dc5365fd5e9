// ABOUTME: Error type shared by every remote lab operation.
// ABOUTME: Failed calls carry the remote diagnostic body alongside the message.

use std::time::Duration;

/// Errors from remote resource operations.
///
/// The diagnostic body travels with the error value, so callers never need
/// to read a client's "last error" after the fact.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource conflict: {0}")]
    Conflict(String),

    #[error("remote operation failed: {message}")]
    Failed {
        message: String,
        diagnostic: Option<String>,
    },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,
}

impl RemoteError {
    pub fn failed(message: impl Into<String>) -> Self {
        RemoteError::Failed {
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn failed_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        RemoteError::Failed {
            message: message.into(),
            diagnostic: Some(body.into()),
        }
    }

    /// Verbatim response body of the failing call, if the remote sent one.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            RemoteError::Failed { diagnostic, .. } => diagnostic.as_deref(),
            _ => None,
        }
    }
}
