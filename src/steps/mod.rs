// ABOUTME: Build steps that drive the remote lab.
// ABOUTME: Deploy, power off, capture, publish, and delete the transient machine.

mod capture;
mod delete;
mod deploy;
mod power_off;
mod publish;

pub use capture::CaptureStep;
pub use delete::DeleteStep;
pub use deploy::{Credentials, DeployStep, WINRM_ARTIFACT};
pub use power_off::PowerOffStep;
pub use publish::PublishStep;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::{Reporter, StateBag, StateError, keys};
use crate::types::{LabId, VirtualMachineId};

/// Collaborators every step is constructed with.
pub struct StepContext<C> {
    pub client: Arc<C>,
    pub reporter: Arc<dyn Reporter>,
    pub config: Arc<Config>,
}

// Derive would require `C: Clone`.
impl<C> Clone for StepContext<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            reporter: Arc::clone(&self.reporter),
            config: Arc::clone(&self.config),
        }
    }
}

/// Id of the build machine from the names in the bag.
///
/// Uses the resource group deploy recorded, which may differ from the lab's.
pub(crate) fn machine_id(state: &StateBag) -> Result<VirtualMachineId, StateError> {
    let lab = LabId::lab(
        state.get(keys::SUBSCRIPTION_ID)?,
        state.get(keys::RESOURCE_GROUP_NAME)?,
        state.get(keys::LAB_NAME)?,
    );
    Ok(lab.virtual_machine(state.get(keys::COMPUTE_NAME)?))
}

/// Configured tags plus build provenance.
pub(crate) fn build_tags(config: &Config) -> BTreeMap<String, String> {
    let mut tags = config.tags.clone();
    tags.insert(
        "labforge-build-host".to_string(),
        gethostname::gethostname().to_string_lossy().into_owned(),
    );
    tags.insert(
        "labforge-build-time".to_string(),
        chrono::Utc::now().to_rfc3339(),
    );
    tags
}
