// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles image names, gallery versions, and region lists.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{GalleryVersion, ImageName};

pub fn deserialize_image_name<'de, D>(deserializer: D) -> Result<ImageName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_gallery_version<'de, D>(deserializer: D) -> Result<GalleryVersion, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    GalleryVersion::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_regions<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let regions: Vec<String> = values
        .into_iter()
        .map(|r| r.trim().to_string())
        .collect();

    if regions.iter().any(String::is_empty) {
        return Err(serde::de::Error::custom("replication region cannot be empty"));
    }

    NonEmpty::from_vec(regions)
        .ok_or_else(|| serde::de::Error::custom("at least one replication region is required"))
}
