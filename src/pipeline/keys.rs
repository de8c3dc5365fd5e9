// ABOUTME: Well-known state bag keys shared between steps.
// ABOUTME: Each key fixes the type of the value stored under it.

use super::state::StateKey;
use super::step::{Disposition, StepFailure};
use crate::remote::CustomImage;
use crate::types::GalleryImageVersionId;

pub const SUBSCRIPTION_ID: StateKey<String> = StateKey::new("subscription-id");
pub const LAB_NAME: StateKey<String> = StateKey::new("lab-name");

/// Starts as the lab's group; deploy overwrites it with the group the
/// machine actually landed in.
pub const RESOURCE_GROUP_NAME: StateKey<String> = StateKey::new("resource-group-name");

pub const COMPUTE_NAME: StateKey<String> = StateKey::new("compute-name");
pub const DEPLOYMENT_NAME: StateKey<String> = StateKey::new("deployment-name");

/// Address a remote-shell connector uses to reach the machine.
pub const CONNECT_HOST: StateKey<String> = StateKey::new("ssh/connect-host");

/// Set before the create request goes out; the machine may exist from then on.
pub const VM_CREATE_SUBMITTED: StateKey<bool> = StateKey::new("vm-create-submitted");
pub const VM_CREATED: StateKey<bool> = StateKey::new("vm-created");
pub const VM_DELETED: StateKey<bool> = StateKey::new("vm-deleted");

pub const CAPTURED_TEMPLATE: StateKey<CustomImage> = StateKey::new("captured-template");
pub const GALLERY_IMAGE_VERSION: StateKey<GalleryImageVersionId> =
    StateKey::new("gallery-image-version");

pub const ERROR: StateKey<StepFailure> = StateKey::new("error");
pub const DISPOSITION: StateKey<Disposition> = StateKey::new("disposition");
