// ABOUTME: Request and resource types shared by the remote lab traits.
// ABOUTME: Virtual machine, custom image, network interface, and gallery shapes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{
    CustomImageId, GalleryImageId, GalleryImageVersionId, NetworkInterfaceId, VirtualMachineId,
};

/// Operating system family of a machine or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Linux,
    Windows,
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsType::Linux => write!(f, "Linux"),
            OsType::Windows => write!(f, "Windows"),
        }
    }
}

/// Marketplace image coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceImage {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    #[serde(default = "default_image_version")]
    pub version: String,
}

fn default_image_version() -> String {
    "latest".to_string()
}

/// Image a new machine boots from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceImage {
    Marketplace(MarketplaceImage),
    Custom(CustomImageId),
}

/// Disk storage tier for the transient machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    #[default]
    Standard,
    Premium,
    StandardSSD,
}

/// A lab artifact to install on a machine, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInstall {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ArtifactInstall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Request body for creating a lab virtual machine.
#[derive(Debug, Clone)]
pub struct VirtualMachineSpec {
    pub location: String,
    pub size: String,
    pub os_type: OsType,
    pub image: SourceImage,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub ssh_public_key: Option<String>,
    pub lab_virtual_network: String,
    pub lab_subnet: String,
    pub disallow_public_ip: bool,
    pub storage_type: StorageType,
    pub artifacts: Vec<ArtifactInstall>,
    pub tags: BTreeMap<String, String>,
}

/// Power state reported for a lab machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Running,
    Stopped,
}

/// A lab virtual machine as reported by the remote.
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    pub id: VirtualMachineId,
    pub name: String,
    pub location: String,
    pub os_type: OsType,
    pub power_state: PowerState,
    /// Public FQDN, absent when public addressing is disallowed.
    pub fqdn: Option<String>,
    pub network_interface: Option<NetworkInterfaceId>,
}

impl VirtualMachine {
    /// Resource group the machine actually landed in.
    pub fn resource_group(&self) -> &str {
        self.id.resource_group()
    }
}

#[derive(Debug, Clone)]
pub struct NetworkInterface {
    pub id: NetworkInterfaceId,
    pub private_ip_address: Option<String>,
}

/// Linux deprovisioning state for image capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinuxOsState {
    /// The remote runs the deprovisioning agent before capture.
    DeprovisionRequested,
    /// The caller already deprovisioned the machine.
    DeprovisionApplied,
}

/// Windows deprovisioning state for image capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindowsOsState {
    SysprepRequested,
    SysprepApplied,
}

/// OS-specific deprovisioning metadata attached to a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeprovisionInfo {
    Linux(LinuxOsState),
    Windows(WindowsOsState),
}

impl DeprovisionInfo {
    pub fn for_os(os_type: OsType, already_applied: bool) -> Self {
        match (os_type, already_applied) {
            (OsType::Linux, false) => DeprovisionInfo::Linux(LinuxOsState::DeprovisionRequested),
            (OsType::Linux, true) => DeprovisionInfo::Linux(LinuxOsState::DeprovisionApplied),
            (OsType::Windows, false) => {
                DeprovisionInfo::Windows(WindowsOsState::SysprepRequested)
            }
            (OsType::Windows, true) => DeprovisionInfo::Windows(WindowsOsState::SysprepApplied),
        }
    }

    pub fn os_type(&self) -> OsType {
        match self {
            DeprovisionInfo::Linux(_) => OsType::Linux,
            DeprovisionInfo::Windows(_) => OsType::Windows,
        }
    }
}

/// Request body for capturing a custom image from a lab machine.
#[derive(Debug, Clone)]
pub struct CustomImageSpec {
    pub source_vm: VirtualMachineId,
    pub deprovision: DeprovisionInfo,
    pub description: String,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct CustomImage {
    pub id: CustomImageId,
    pub location: String,
    pub os_type: OsType,
    /// Deprovisioning state the image was captured with.
    pub deprovision: DeprovisionInfo,
}

/// A shared image gallery image definition.
#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub id: GalleryImageId,
    pub location: String,
    pub os_type: OsType,
}

/// Request body for publishing an image version into a gallery.
#[derive(Debug, Clone)]
pub struct GalleryImageVersionSpec {
    pub location: String,
    pub source_image: CustomImageId,
    pub replication_regions: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct GalleryImageVersion {
    pub id: GalleryImageVersionId,
    pub replication_regions: Vec<String>,
}
