// ABOUTME: Shared image gallery destination configuration.
// ABOUTME: Target image definition, version, replication regions, and timeout.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::time::Duration;

use super::deserialize::{deserialize_gallery_version, deserialize_regions};
use crate::types::{GalleryImageId, GalleryImageVersionId, GalleryVersion};

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryConfig {
    /// Defaults to the build's subscription.
    #[serde(default)]
    pub subscription_id: Option<String>,

    pub resource_group: String,

    pub gallery_name: String,

    pub image_name: String,

    #[serde(deserialize_with = "deserialize_gallery_version")]
    pub image_version: GalleryVersion,

    #[serde(deserialize_with = "deserialize_regions")]
    pub replication_regions: NonEmpty<String>,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60 * 60)
}

impl GalleryConfig {
    pub fn image_id(&self, default_subscription: &str) -> GalleryImageId {
        GalleryImageId::gallery_image(
            self.subscription_id.as_deref().unwrap_or(default_subscription),
            &self.resource_group,
            &self.gallery_name,
            &self.image_name,
        )
    }

    pub fn version_id(&self, default_subscription: &str) -> GalleryImageVersionId {
        self.image_id(default_subscription)
            .version(&self.image_version.to_string())
    }

    /// Append `region` to the replication regions unless already listed.
    ///
    /// Region names compare without case and spaces, so "West Europe"
    /// matches "westeurope". Returns true when the region was appended.
    pub fn ensure_region(&mut self, region: &str) -> bool {
        let wanted = normalize_region(region);
        if self
            .replication_regions
            .iter()
            .any(|r| normalize_region(r) == wanted)
        {
            return false;
        }
        self.replication_regions.push(region.to_string());
        true
    }
}

fn normalize_region(region: &str) -> String {
    region
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
