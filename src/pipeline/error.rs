// ABOUTME: Error types for steps and whole builds.
// ABOUTME: StepError uses thiserror; BuildError uses the SNAFU pattern with a kind accessor.

use std::time::Duration;

use snafu::Snafu;

use super::state::StateError;
use crate::remote::RemoteError;

/// Why a step failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StepError {
    /// A machine with the generated name already exists.
    #[error("a virtual machine named '{0}' already exists in the lab")]
    NameCollision(String),

    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        source: RemoteError,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        last: RemoteError,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

impl StepError {
    /// Classify a remote failure, keeping timeouts and cancellation distinct.
    pub fn remote(operation: &'static str, err: RemoteError) -> Self {
        match err {
            RemoteError::Timeout(after) => StepError::Timeout { operation, after },
            RemoteError::Cancelled => StepError::Cancelled { operation },
            source => StepError::Remote { operation, source },
        }
    }

    /// Remote response body behind this failure, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            StepError::Remote { source, .. } => source.diagnostic(),
            StepError::RetriesExhausted { last, .. } => last.diagnostic(),
            _ => None,
        }
    }
}

/// Errors that end a build.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BuildError {
    #[snafu(display("invalid build configuration: {message}"))]
    Configuration { message: String },

    #[snafu(display("gallery image {image} is unavailable: {source}"))]
    GalleryPrecondition { image: String, source: RemoteError },

    #[snafu(display("step {step} failed: {message}"))]
    Halted {
        step: String,
        message: String,
        diagnostic: Option<String>,
    },

    #[snafu(display("build cancelled"))]
    Cancelled,

    #[snafu(display("build finished without {what}: {source}"))]
    IncompleteState {
        what: &'static str,
        source: StateError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildErrorKind {
    Configuration,
    Precondition,
    StepFailed,
    Cancelled,
    Internal,
}

impl BuildError {
    pub fn kind(&self) -> BuildErrorKind {
        match self {
            BuildError::Configuration { .. } => BuildErrorKind::Configuration,
            BuildError::GalleryPrecondition { .. } => BuildErrorKind::Precondition,
            BuildError::Halted { .. } => BuildErrorKind::StepFailed,
            BuildError::Cancelled => BuildErrorKind::Cancelled,
            BuildError::IncompleteState { .. } => BuildErrorKind::Internal,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            BuildError::Halted { diagnostic, .. } => diagnostic.as_deref(),
            BuildError::GalleryPrecondition { source, .. } => source.diagnostic(),
            _ => None,
        }
    }
}
