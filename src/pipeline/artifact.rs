// ABOUTME: Summary of what a completed build produced.
// ABOUTME: Read back from the state bag after the runner finishes.

use std::fmt;

use serde::Serialize;

use super::keys;
use super::state::{StateBag, StateError};
use crate::remote::OsType;
use crate::types::{CustomImageId, GalleryImageVersionId};

/// The image a build produced.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub image_id: CustomImageId,
    pub location: String,
    pub os_type: OsType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_version: Option<GalleryImageVersionId>,
}

impl Artifact {
    pub fn from_state(state: &StateBag) -> Result<Self, StateError> {
        let image = state.get(keys::CAPTURED_TEMPLATE)?;
        Ok(Self {
            image_id: image.id.clone(),
            location: image.location.clone(),
            os_type: image.os_type,
            gallery_version: state.find(keys::GALLERY_IMAGE_VERSION)?.cloned(),
        })
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} image {} ({})", self.os_type, self.image_id.name(), self.location)?;
        if let Some(version) = &self.gallery_version {
            write!(f, ", published as {version}")?;
        }
        Ok(())
    }
}
