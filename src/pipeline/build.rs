// ABOUTME: Entry point that runs a whole image build against a lab client.
// ABOUTME: Validates config, checks preconditions, runs the pipeline, and reads the artifact.

use std::sync::Arc;

use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::artifact::Artifact;
use super::assembler::{assemble, initial_state, prepare_gallery};
use super::error::{BuildError, IncompleteStateSnafu};
use super::keys;
use super::report::Reporter;
use super::step::Disposition;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::remote::LabClient;
use crate::steps::{Credentials, StepContext};
use crate::types::TempNames;

/// Result of a completed build.
#[derive(Debug)]
pub struct BuildReport {
    pub artifact: Artifact,
    pub diagnostics: Diagnostics,
    /// Steps that ran, in order.
    pub steps: Vec<&'static str>,
}

/// Run a full build.
///
/// Cleanup has always run by the time this returns, whatever the outcome.
pub async fn run_build<C: LabClient + 'static>(
    mut config: Config,
    client: Arc<C>,
    reporter: Arc<dyn Reporter>,
    cancel: &CancellationToken,
) -> Result<BuildReport, BuildError> {
    config.validate().map_err(|e| BuildError::Configuration {
        message: e.to_string(),
    })?;

    let mut diagnostics = Diagnostics::default();
    prepare_gallery(client.as_ref(), &mut config, &mut diagnostics).await?;

    let names = TempNames::generate();
    let credentials = Credentials::resolve(&config.admin, config.os_type, &names).map_err(|e| {
        BuildError::Configuration {
            message: e.to_string(),
        }
    })?;

    let mut state = initial_state(&config, &names);
    let ctx = StepContext {
        client,
        reporter,
        config: Arc::new(config),
    };
    let runner = assemble(ctx, credentials)?;

    info!(steps = ?runner.step_names(), compute_name = %names.compute_name, "starting build");
    let outcome = runner.run(cancel, &mut state).await;
    diagnostics.extend(outcome.diagnostics);

    match outcome.disposition {
        Disposition::Completed => {
            let artifact = Artifact::from_state(&state).context(IncompleteStateSnafu {
                what: "a captured image",
            })?;
            info!(image = %artifact.image_id, "build completed");
            Ok(BuildReport {
                artifact,
                diagnostics,
                steps: outcome.started,
            })
        }
        Disposition::Cancelled => Err(BuildError::Cancelled),
        Disposition::Halted => {
            let failure = state.find(keys::ERROR).ok().flatten().cloned();
            Err(match failure {
                Some(failure) => BuildError::Halted {
                    step: failure.step,
                    message: failure.message,
                    diagnostic: failure.diagnostic,
                },
                None => BuildError::Halted {
                    step: outcome.started.last().copied().unwrap_or_default().to_string(),
                    message: "step halted without recording an error".to_string(),
                    diagnostic: None,
                },
            })
        }
    }
}
