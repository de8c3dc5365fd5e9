// ABOUTME: Sequential step runner with halt, cancellation, and reverse cleanup.
// ABOUTME: Records the final disposition in the state bag.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::keys;
use super::state::StateBag;
use super::step::{Action, Disposition, Step};
use crate::diagnostics::{Diagnostics, Warning};

/// What a run did, for callers that need more than the bag.
#[derive(Debug)]
pub struct RunOutcome {
    pub disposition: Disposition,
    /// Names of steps whose `run` was started, in start order.
    pub started: Vec<&'static str>,
    pub diagnostics: Diagnostics,
}

/// Drives an ordered list of steps against one state bag.
pub struct Runner {
    steps: Vec<Box<dyn Step>>,
}

impl Runner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run steps in order until one halts or `cancel` fires, then clean up
    /// every started step in reverse order.
    pub async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> RunOutcome {
        let mut disposition = Disposition::Completed;
        let mut started = 0;

        for step in &self.steps {
            if cancel.is_cancelled() {
                info!(step = step.name(), "build cancelled before step");
                disposition = Disposition::Cancelled;
                break;
            }

            info!(step = step.name(), "running step");
            started += 1;

            match step.run(cancel, state).await {
                Action::Continue => debug!(step = step.name(), "step finished"),
                Action::Halt => {
                    disposition = if cancel.is_cancelled() {
                        Disposition::Cancelled
                    } else {
                        Disposition::Halted
                    };
                    info!(step = step.name(), ?disposition, "step halted the build");
                    break;
                }
            }
        }

        state.put(keys::DISPOSITION, disposition);

        let mut diagnostics = Diagnostics::default();
        for step in self.steps[..started].iter().rev() {
            debug!(step = step.name(), "cleaning up step");
            if let Err(err) = step.cleanup(state).await {
                warn!(step = step.name(), error = %err, "cleanup failed");
                diagnostics.warn(Warning::cleanup_failed(step.name(), err.to_string()));
            }
        }

        RunOutcome {
            disposition,
            started: self.steps[..started].iter().map(|s| s.name()).collect(),
            diagnostics,
        }
    }
}
