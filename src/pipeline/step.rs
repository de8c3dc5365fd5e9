// ABOUTME: Step contract for the build pipeline.
// ABOUTME: Steps run once against the state bag and may compensate in cleanup.

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::error::StepError;
use super::keys;
use super::report::Reporter;
use super::state::StateBag;

/// Control signal a step hands back to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Halt,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Completed,
    Halted,
    Cancelled,
}

/// The error a halting step leaves in the state bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: String,
    pub message: String,
    pub diagnostic: Option<String>,
}

/// One unit of work in a build pipeline.
///
/// `run` is called at most once. `cleanup` is called once after the walk
/// for every step whose `run` started, in reverse order, whatever the outcome.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> Action;

    /// Best-effort compensation. Errors are logged by the runner.
    async fn cleanup(&self, _state: &mut StateBag) -> Result<(), StepError> {
        Ok(())
    }
}

/// Report a step failure, record it in the bag, and halt.
pub fn halt(
    step: &'static str,
    reporter: &dyn Reporter,
    state: &mut StateBag,
    err: StepError,
) -> Action {
    let message = err.to_string();
    reporter.error(&format!("{step}: {message}"));

    let diagnostic = err.diagnostic().map(str::to_string);
    if let Some(body) = &diagnostic {
        reporter.error(&format!("{step}: remote response: {body}"));
    }

    tracing::error!(step, error = %message, "step failed");
    state.put(
        keys::ERROR,
        StepFailure {
            step: step.to_string(),
            message,
            diagnostic,
        },
    );
    Action::Halt
}
