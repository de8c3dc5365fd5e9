// ABOUTME: Composable capability traits for remote lab clients.
// ABOUTME: Defines VirtualMachineOps, ImageOps, NetworkOps, GalleryOps, and LabClient.

mod gallery;
mod image;
mod network;
mod shared_types;
mod virtual_machine;

pub use gallery::GalleryOps;
pub use image::ImageOps;
pub use network::NetworkOps;
pub use shared_types::*;
pub use virtual_machine::VirtualMachineOps;

/// Everything a build pipeline needs from a remote lab.
pub trait LabClient: VirtualMachineOps + ImageOps + NetworkOps + GalleryOps {}

impl<T> LabClient for T where T: VirtualMachineOps + ImageOps + NetworkOps + GalleryOps {}
