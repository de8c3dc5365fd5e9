// ABOUTME: Shared image gallery operations trait.
// ABOUTME: Looks up image definitions and publishes image versions.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::shared_types::{GalleryImage, GalleryImageVersion, GalleryImageVersionSpec};
use crate::remote::{PollOptions, RemoteError};
use crate::types::{GalleryImageId, GalleryImageVersionId};

/// Shared image gallery operations.
#[async_trait]
pub trait GalleryOps: Send + Sync {
    /// Fetch a gallery image definition.
    async fn get_gallery_image(&self, id: &GalleryImageId) -> Result<GalleryImage, RemoteError>;

    /// Publish an image version and wait for replication to finish.
    async fn create_or_update_gallery_image_version(
        &self,
        id: &GalleryImageVersionId,
        spec: &GalleryImageVersionSpec,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<GalleryImageVersion, RemoteError>;
}
