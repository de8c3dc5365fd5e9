// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent resource ID confusion at compile time.

mod gallery_version;
mod image_name;
mod resource_id;
mod temp_names;

pub use gallery_version::{GalleryVersion, ParseGalleryVersionError};
pub use image_name::{ImageName, ImageNameError};
pub use resource_id::{
    CustomImageId, CustomImageMarker, GalleryImageId, GalleryImageMarker, GalleryImageVersionId,
    GalleryImageVersionMarker, LabId, LabMarker, NetworkInterfaceId, NetworkInterfaceMarker,
    ResourceId, ResourceKind, VirtualMachineId, VirtualMachineMarker,
};
pub use temp_names::TempNames;
