// ABOUTME: Custom image operations trait for remote labs.
// ABOUTME: Capture images from machines and look them up.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::shared_types::{CustomImage, CustomImageSpec};
use crate::remote::{PollOptions, RemoteError};
use crate::types::CustomImageId;

/// Custom image operations.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Capture an image from the request's source machine and wait for it.
    async fn create_or_update_custom_image(
        &self,
        id: &CustomImageId,
        spec: &CustomImageSpec,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<CustomImage, RemoteError>;

    /// Fetch a custom image.
    async fn get_custom_image(&self, id: &CustomImageId) -> Result<CustomImage, RemoteError>;
}
