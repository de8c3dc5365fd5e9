// ABOUTME: Capture step: create a lab custom image from the stopped machine.
// ABOUTME: Picks the OS-specific deprovisioning state and stores the captured image.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{StepContext, build_tags, machine_id};
use crate::pipeline::{Action, StateBag, Step, StepError, halt, keys};
use crate::remote::{CustomImageSpec, DeprovisionInfo, LabClient};

const NAME: &str = "capture";

pub struct CaptureStep<C> {
    ctx: StepContext<C>,
}

impl<C: LabClient> CaptureStep<C> {
    pub fn new(ctx: StepContext<C>) -> Self {
        Self { ctx }
    }

    async fn capture(
        &self,
        cancel: &CancellationToken,
        state: &mut StateBag,
    ) -> Result<(), StepError> {
        let config = &self.ctx.config;
        let capture = &config.capture;
        let source_vm = machine_id(state)?;

        // Images live in the lab itself, not wherever the machine landed.
        let image_id = config.lab_id().custom_image(capture.image_name.as_str());
        let deprovision = DeprovisionInfo::for_os(config.os_type, capture.deprovision_applied);

        self.ctx
            .reporter
            .say(&format!("Capturing image {}", image_id.name()));
        self.ctx.reporter.say(&format!(" -> Source: {source_vm}"));
        self.ctx.reporter.say(&format!(" -> Deprovision: {deprovision:?}"));

        let spec = CustomImageSpec {
            description: capture
                .description
                .clone()
                .unwrap_or_else(|| format!("Captured from {}", source_vm.name())),
            source_vm,
            deprovision,
            tags: build_tags(config),
        };

        let poll = config.polling.with_timeout(capture.timeout);
        let image = self
            .ctx
            .client
            .create_or_update_custom_image(&image_id, &spec, &poll, cancel)
            .await
            .map_err(|e| StepError::remote("capture image", e))?;

        info!(image = %image.id, location = %image.location, "image captured");
        self.ctx
            .reporter
            .say(&format!(" -> Image {} captured in {}", image.id.name(), image.location));
        state.put(keys::CAPTURED_TEMPLATE, image);
        Ok(())
    }
}

#[async_trait]
impl<C: LabClient + 'static> Step for CaptureStep<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> Action {
        match self.capture(cancel, state).await {
            Ok(()) => Action::Continue,
            Err(err) => halt(NAME, self.ctx.reporter.as_ref(), state, err),
        }
    }
}
