// ABOUTME: Publish step: replicate the captured image into a shared image gallery.
// ABOUTME: Creates a gallery image version sourced from the captured custom image.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{StepContext, build_tags};
use crate::pipeline::{Action, StateBag, Step, StepError, halt, keys};
use crate::remote::{GalleryImageVersionSpec, LabClient};

const NAME: &str = "publish";

pub struct PublishStep<C> {
    ctx: StepContext<C>,
}

impl<C: LabClient> PublishStep<C> {
    pub fn new(ctx: StepContext<C>) -> Self {
        Self { ctx }
    }

    async fn publish(
        &self,
        cancel: &CancellationToken,
        state: &mut StateBag,
    ) -> Result<(), StepError> {
        let config = &self.ctx.config;
        let gallery = config.gallery.as_ref().ok_or_else(|| {
            StepError::MissingPrerequisite("no gallery destination configured".to_string())
        })?;
        let image = state.get(keys::CAPTURED_TEMPLATE)?;

        let version_id = gallery.version_id(&config.subscription_id);
        let regions: Vec<String> = gallery.replication_regions.iter().cloned().collect();

        self.ctx.reporter.say(&format!(
            "Publishing {} to gallery {} as version {}",
            image.id.name(),
            gallery.gallery_name,
            gallery.image_version
        ));
        self.ctx
            .reporter
            .say(&format!(" -> Replication regions: {}", regions.join(", ")));

        let spec = GalleryImageVersionSpec {
            location: image.location.clone(),
            source_image: image.id.clone(),
            replication_regions: regions,
            tags: build_tags(config),
        };

        let poll = config.polling.with_timeout(gallery.timeout);
        let version = self
            .ctx
            .client
            .create_or_update_gallery_image_version(&version_id, &spec, &poll, cancel)
            .await
            .map_err(|e| StepError::remote("publish gallery image version", e))?;

        info!(version = %version.id, "gallery image version published");
        self.ctx.reporter.say(" -> Gallery image version published");
        state.put(keys::GALLERY_IMAGE_VERSION, version.id);
        Ok(())
    }
}

#[async_trait]
impl<C: LabClient + 'static> Step for PublishStep<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> Action {
        match self.publish(cancel, state).await {
            Ok(()) => Action::Continue,
            Err(err) => halt(NAME, self.ctx.reporter.as_ref(), state, err),
        }
    }
}
