// ABOUTME: Configuration types and parsing for labforge.yml.
// ABOUTME: Handles YAML parsing, secret resolution, defaults, and cross-field validation.

mod deserialize;
mod gallery;
mod polling;
mod secret;

pub use gallery::GalleryConfig;
pub use polling::PollingConfig;
pub use secret::SecretValue;

use crate::error::{Error, Result};
use crate::pipeline::RetryPolicy;
use crate::remote::{ArtifactInstall, MarketplaceImage, OsType, SourceImage, StorageType};
use crate::types::{ImageName, LabId};
use deserialize::deserialize_image_name;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "labforge.yml";
pub const CONFIG_FILENAME_ALT: &str = "labforge.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".labforge/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub subscription_id: String,

    /// Resource group that holds the lab.
    pub resource_group: String,

    pub lab_name: String,

    pub location: String,

    pub os_type: OsType,

    pub source: SourceConfig,

    #[serde(default = "default_vm_size")]
    pub vm_size: String,

    #[serde(default)]
    pub storage_type: StorageType,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub network: LabNetworkConfig,

    /// Lab artifacts installed while the machine is created.
    #[serde(default)]
    pub artifacts: Vec<ArtifactInstall>,

    pub capture: CaptureConfig,

    #[serde(default)]
    pub gallery: Option<GalleryConfig>,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub winrm_retry: RetryPolicy,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Image the transient machine boots from. Exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub marketplace: Option<MarketplaceImage>,

    /// Name of a custom image already in the lab.
    #[serde(default)]
    pub custom_image: Option<String>,
}

impl SourceConfig {
    pub fn resolve(&self, lab: &LabId) -> Result<SourceImage> {
        match (&self.marketplace, &self.custom_image) {
            (Some(image), None) => Ok(SourceImage::Marketplace(image.clone())),
            (None, Some(name)) => Ok(SourceImage::Custom(lab.custom_image(name))),
            (Some(_), Some(_)) => Err(Error::InvalidConfig(
                "source: set either marketplace or custom_image, not both".to_string(),
            )),
            (None, None) => Err(Error::InvalidConfig(
                "source: one of marketplace or custom_image is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    /// Generated per build when absent.
    #[serde(default)]
    pub password: Option<SecretValue>,

    #[serde(default)]
    pub ssh_public_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            username: default_admin_username(),
            password: None,
            ssh_public_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabNetworkConfig {
    #[serde(default)]
    pub virtual_network: Option<String>,

    #[serde(default)]
    pub subnet: Option<String>,

    /// Reach the machine through its private address instead of a public one.
    #[serde(default)]
    pub disallow_public_ip: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(deserialize_with = "deserialize_image_name")]
    pub image_name: ImageName,

    /// The machine was already generalized (sysprep / waagent -deprovision).
    #[serde(default)]
    pub deprovision_applied: bool,

    #[serde(default = "default_capture_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_vm_size() -> String {
    "Standard_DS2_v2".to_string()
}

fn default_admin_username() -> String {
    "labforge".to_string()
}

fn default_capture_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The lab every transient resource is created in.
    pub fn lab_id(&self) -> LabId {
        LabId::lab(&self.subscription_id, &self.resource_group, &self.lab_name)
    }

    /// Lab virtual network, defaulting to the lab's own `Dtl<lab>` network.
    pub fn lab_virtual_network(&self) -> String {
        self.network
            .virtual_network
            .clone()
            .unwrap_or_else(|| format!("Dtl{}", self.lab_name))
    }

    pub fn lab_subnet(&self) -> String {
        self.network
            .subnet
            .clone()
            .unwrap_or_else(|| format!("Dtl{}Subnet", self.lab_name))
    }

    /// Check cross-field rules that serde can't express.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("subscription_id", &self.subscription_id),
            ("resource_group", &self.resource_group),
            ("lab_name", &self.lab_name),
            ("location", &self.location),
            ("vm_size", &self.vm_size),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
            }
        }

        self.source.resolve(&self.lab_id())?;

        if self.polling.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "polling.interval must be greater than zero".to_string(),
            ));
        }

        let timeouts = [
            ("polling.deployment_timeout", self.polling.deployment_timeout),
            ("capture.timeout", self.capture.timeout),
        ];
        for (field, timeout) in timeouts {
            if timeout.is_zero() {
                return Err(Error::InvalidConfig(format!(
                    "{field} must be greater than zero"
                )));
            }
        }

        if let Some(gallery) = &self.gallery
            && gallery.timeout.is_zero()
        {
            return Err(Error::InvalidConfig(
                "gallery.timeout must be greater than zero".to_string(),
            ));
        }

        self.winrm_retry
            .validate()
            .map_err(|e| Error::InvalidConfig(format!("winrm_retry: {e}")))?;

        if self.os_type == OsType::Windows && self.admin.ssh_public_key.is_some() {
            return Err(Error::InvalidConfig(
                "admin.ssh_public_key is only supported for linux builds".to_string(),
            ));
        }

        Ok(())
    }

    pub fn template() -> Self {
        Config {
            subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
            resource_group: "my-lab-rg".to_string(),
            lab_name: "my-lab".to_string(),
            location: "westeurope".to_string(),
            os_type: OsType::Linux,
            source: SourceConfig {
                marketplace: Some(MarketplaceImage {
                    publisher: "Canonical".to_string(),
                    offer: "0001-com-ubuntu-server-jammy".to_string(),
                    sku: "22_04-lts".to_string(),
                    version: "latest".to_string(),
                }),
                custom_image: None,
            },
            vm_size: default_vm_size(),
            storage_type: StorageType::default(),
            admin: AdminConfig::default(),
            network: LabNetworkConfig::default(),
            artifacts: Vec::new(),
            capture: CaptureConfig {
                image_name: ImageName::new("my-image").expect("template image name is valid"),
                deprovision_applied: false,
                timeout: default_capture_timeout(),
                description: None,
            },
            gallery: None,
            polling: PollingConfig::default(),
            winrm_retry: RetryPolicy::default(),
            tags: BTreeMap::new(),
        }
    }
}

pub fn init_config(dir: &Path, lab: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();
    if let Some(lab) = lab {
        if lab.trim().is_empty() {
            return Err(Error::InvalidConfig("lab name cannot be empty".to_string()));
        }
        config.lab_name = lab.to_string();
    }

    std::fs::write(&config_path, generate_template_yaml(&config))?;
    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let (publisher, offer, sku) = config
        .source
        .marketplace
        .as_ref()
        .map(|i| (i.publisher.as_str(), i.offer.as_str(), i.sku.as_str()))
        .unwrap_or(("Canonical", "0001-com-ubuntu-server-jammy", "22_04-lts"));
    format!(
        r#"subscription_id: {}
resource_group: {}
lab_name: {}
location: {}
os_type: linux

source:
  marketplace:
    publisher: {}
    offer: {}
    sku: {}

vm_size: {}

capture:
  image_name: {}
  # Set when the machine was generalized before capture
  # deprovision_applied: true

# Publish the captured image to a shared image gallery
# gallery:
#   resource_group: gallery-rg
#   gallery_name: shared
#   image_name: ubuntu
#   image_version: 1.0.0
#   replication_regions: [westeurope]
"#,
        config.subscription_id,
        config.resource_group,
        config.lab_name,
        config.location,
        publisher,
        offer,
        sku,
        config.vm_size,
        config.capture.image_name,
    )
}
