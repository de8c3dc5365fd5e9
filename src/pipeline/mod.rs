// ABOUTME: Step pipeline engine: state bag, step contract, runner, and assembly.
// ABOUTME: Drives steps in order and unwinds them in reverse.

mod artifact;
mod assembler;
mod build;
mod error;
pub mod keys;
mod report;
mod retry;
mod runner;
mod state;
mod step;

pub use artifact::Artifact;
pub use assembler::{assemble, initial_state, prepare_gallery, step_plan};
pub use build::{BuildReport, run_build};
pub use error::{BuildError, BuildErrorKind, StepError};
pub use report::{RecordingReporter, ReportEvent, Reporter};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use runner::{RunOutcome, Runner};
pub use state::{StateBag, StateError, StateKey};
pub use step::{Action, Disposition, Step, StepFailure, halt};
