// ABOUTME: Chooses the build's step list and seeds its state bag.
// ABOUTME: Also checks gallery preconditions before any machine is created.

use snafu::ResultExt;

use super::error::{BuildError, GalleryPreconditionSnafu};
use super::keys;
use super::runner::Runner;
use super::state::StateBag;
use super::step::Step;
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::remote::{GalleryOps, LabClient};
use crate::steps::{
    CaptureStep, Credentials, DeleteStep, DeployStep, PowerOffStep, PublishStep, StepContext,
};
use crate::types::TempNames;

/// Names of the steps a build with this config runs, in order.
pub fn step_plan(config: &Config) -> Vec<&'static str> {
    let mut plan = vec!["deploy", "power-off", "capture"];
    if config.gallery.is_some() {
        plan.push("publish");
    }
    plan.push("delete");
    plan
}

/// Build the runner: deploy, power-off, capture, then publish when a gallery
/// is configured, and finally delete.
pub fn assemble<C: LabClient + 'static>(
    ctx: StepContext<C>,
    credentials: Credentials,
) -> Result<Runner, BuildError> {
    let image = ctx
        .config
        .source
        .resolve(&ctx.config.lab_id())
        .map_err(|e| BuildError::Configuration {
            message: e.to_string(),
        })?;

    let mut steps: Vec<Box<dyn Step>> = vec![
        Box::new(DeployStep::new(ctx.clone(), credentials, image)),
        Box::new(PowerOffStep::new(ctx.clone())),
        Box::new(CaptureStep::new(ctx.clone())),
    ];
    if ctx.config.gallery.is_some() {
        steps.push(Box::new(PublishStep::new(ctx.clone())));
    }
    steps.push(Box::new(DeleteStep::new(ctx)));

    Ok(Runner::new(steps))
}

/// Verify the gallery destination before the build starts.
///
/// The image definition must exist and match the build's OS. The build
/// location is added to the replication regions when missing.
pub async fn prepare_gallery<C: GalleryOps + ?Sized>(
    client: &C,
    config: &mut Config,
    diagnostics: &mut Diagnostics,
) -> Result<(), BuildError> {
    let location = config.location.clone();
    let subscription = config.subscription_id.clone();
    let os_type = config.os_type;
    let Some(gallery) = config.gallery.as_mut() else {
        return Ok(());
    };

    let image_id = gallery.image_id(&subscription);
    let image = client
        .get_gallery_image(&image_id)
        .await
        .context(GalleryPreconditionSnafu {
            image: image_id.to_string(),
        })?;

    if image.os_type != os_type {
        return Err(BuildError::Configuration {
            message: format!(
                "gallery image {} is {} but the build is {}",
                image_id.name(),
                image.os_type,
                os_type
            ),
        });
    }

    if gallery.ensure_region(&location) {
        diagnostics.warn(Warning::region_appended(&location));
    }
    Ok(())
}

/// State bag every build starts with.
pub fn initial_state(config: &Config, names: &TempNames) -> StateBag {
    let mut state = StateBag::new();
    state.put(keys::SUBSCRIPTION_ID, config.subscription_id.clone());
    state.put(keys::LAB_NAME, config.lab_name.clone());
    state.put(keys::RESOURCE_GROUP_NAME, config.resource_group.clone());
    state.put(keys::COMPUTE_NAME, names.compute_name.clone());
    state.put(keys::DEPLOYMENT_NAME, names.deployment_name.clone());
    state
}
