// ABOUTME: In-memory lab implementing every remote client trait.
// ABOUTME: Supports fault injection, slow operations, and resource-group relocation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::{
    ArtifactInstall, CustomImage, CustomImageSpec, GalleryImage, GalleryImageVersion,
    GalleryImageVersionSpec, GalleryOps, ImageOps, NetworkInterface, NetworkOps,
    OperationStatus, OsType, PollOptions, PowerState, RemoteError, VirtualMachine,
    VirtualMachineOps, VirtualMachineSpec, poll_to_completion,
};
use crate::types::{
    CustomImageId, GalleryImageId, GalleryImageVersionId, LabId, NetworkInterfaceId,
    VirtualMachineId,
};

/// Remote calls the in-memory lab records and can fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListVirtualMachines,
    CreateVirtualMachine,
    GetVirtualMachine,
    StopVirtualMachine,
    DeleteVirtualMachine,
    ApplyArtifacts,
    CreateCustomImage,
    GetCustomImage,
    GetNetworkInterface,
    GetGalleryImage,
    CreateGalleryImageVersion,
}

/// Failure behavior injected for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail the next `n` calls, then behave normally.
    FailTimes(u32),
    /// Fail every call.
    FailAlways,
    /// Accept the call but never reach a terminal state.
    NeverComplete,
}

#[derive(Default)]
struct LabState {
    machines: HashMap<VirtualMachineId, VirtualMachine>,
    interfaces: HashMap<NetworkInterfaceId, NetworkInterface>,
    images: HashMap<CustomImageId, CustomImage>,
    gallery_images: HashMap<GalleryImageId, GalleryImage>,
    gallery_versions: HashMap<GalleryImageVersionId, GalleryImageVersion>,
    faults: HashMap<Operation, Fault>,
    calls: Vec<Operation>,
    applied_artifacts: Vec<(VirtualMachineId, ArtifactInstall)>,
    next_host: u8,
}

/// A lab that lives in process memory.
///
/// Pollable operations report "in progress" for `pending_polls` status
/// queries before completing, so callers exercise the real polling path.
pub struct MemoryLab {
    location: String,
    pending_polls: u32,
    relocate_to: Option<String>,
    state: Mutex<LabState>,
}

impl MemoryLab {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            pending_polls: 0,
            relocate_to: None,
            state: Mutex::new(LabState {
                next_host: 4,
                ..Default::default()
            }),
        }
    }

    /// Number of "in progress" answers before each pollable call completes.
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Create machines in `resource_group` instead of the requested group.
    pub fn relocating_to(mut self, resource_group: impl Into<String>) -> Self {
        self.relocate_to = Some(resource_group.into());
        self
    }

    pub fn inject(&self, operation: Operation, fault: Fault) {
        self.state.lock().faults.insert(operation, fault);
    }

    /// Add a pre-existing running machine to a lab.
    pub fn seed_virtual_machine(&self, lab: &LabId, name: &str, os_type: OsType) {
        let id = lab.virtual_machine(name);
        let machine = VirtualMachine {
            id: id.clone(),
            name: name.to_string(),
            location: self.location.clone(),
            os_type,
            power_state: PowerState::Running,
            fqdn: None,
            network_interface: None,
        };
        self.state.lock().machines.insert(id, machine);
    }

    /// Add a gallery image definition.
    pub fn seed_gallery_image(&self, id: &GalleryImageId, os_type: OsType) {
        let image = GalleryImage {
            id: id.clone(),
            location: self.location.clone(),
            os_type,
        };
        self.state.lock().gallery_images.insert(id.clone(), image);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| **c == operation)
            .count()
    }

    pub fn virtual_machine(&self, id: &VirtualMachineId) -> Option<VirtualMachine> {
        self.state.lock().machines.get(id).cloned()
    }

    pub fn virtual_machine_count(&self) -> usize {
        self.state.lock().machines.len()
    }

    pub fn applied_artifacts(&self) -> Vec<ArtifactInstall> {
        self.state
            .lock()
            .applied_artifacts
            .iter()
            .map(|(_, artifact)| artifact.clone())
            .collect()
    }

    pub fn custom_image(&self, id: &CustomImageId) -> Option<CustomImage> {
        self.state.lock().images.get(id).cloned()
    }

    pub fn gallery_version(&self, id: &GalleryImageVersionId) -> Option<GalleryImageVersion> {
        self.state.lock().gallery_versions.get(id).cloned()
    }

    /// Record the call and apply any injected fault.
    ///
    /// Returns `Ok(true)` when the operation should never complete.
    fn begin(&self, operation: Operation) -> Result<bool, RemoteError> {
        let mut state = self.state.lock();
        state.calls.push(operation);

        let fault = state.faults.get(&operation).copied();
        match fault {
            None => Ok(false),
            Some(Fault::NeverComplete) => Ok(true),
            Some(Fault::FailAlways) => Err(injected_failure(operation)),
            Some(Fault::FailTimes(n)) => {
                if n <= 1 {
                    state.faults.remove(&operation);
                } else {
                    state.faults.insert(operation, Fault::FailTimes(n - 1));
                }
                Err(injected_failure(operation))
            }
        }
    }

    /// Answer status queries until the operation completes with `value`.
    async fn complete<T: Clone + Send>(
        &self,
        never_complete: bool,
        poll: &PollOptions,
        cancel: &CancellationToken,
        value: T,
    ) -> Result<T, RemoteError> {
        let mut remaining = self.pending_polls;
        poll_to_completion(poll, cancel, move || {
            let status = if never_complete || remaining > 0 {
                remaining = remaining.saturating_sub(1);
                OperationStatus::InProgress
            } else {
                OperationStatus::Succeeded(value.clone())
            };
            std::future::ready(Ok(status))
        })
        .await
    }
}

impl Default for MemoryLab {
    fn default() -> Self {
        Self::new("westeurope")
    }
}

fn injected_failure(operation: Operation) -> RemoteError {
    let body = serde_json::json!({
        "error": {
            "code": "InjectedFault",
            "message": format!("{operation:?} failed in the in-memory lab"),
        }
    });
    RemoteError::failed_with_body(format!("{operation:?} failed"), body.to_string())
}

fn not_found(what: &str, id: impl std::fmt::Display) -> RemoteError {
    RemoteError::NotFound(format!("{what} {id}"))
}

#[async_trait]
impl VirtualMachineOps for MemoryLab {
    async fn list_virtual_machines(
        &self,
        lab: &LabId,
    ) -> Result<Vec<VirtualMachine>, RemoteError> {
        self.begin(Operation::ListVirtualMachines)?;
        let state = self.state.lock();
        let mut machines: Vec<_> = state
            .machines
            .values()
            .filter(|m| {
                m.id.lab_name() == lab.name()
                    && m.id.subscription().eq_ignore_ascii_case(lab.subscription())
            })
            .cloned()
            .collect();
        machines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(machines)
    }

    async fn create_or_update_virtual_machine(
        &self,
        id: &VirtualMachineId,
        spec: &VirtualMachineSpec,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<VirtualMachine, RemoteError> {
        let never_complete = self.begin(Operation::CreateVirtualMachine)?;

        // The machine exists as soon as the request is accepted, under the
        // requested id. It moves to its final group once provisioning finishes.
        let machine = {
            let mut state = self.state.lock();
            let host = state.next_host;
            state.next_host = state.next_host.wrapping_add(1);

            let resource_group = self
                .relocate_to
                .clone()
                .unwrap_or_else(|| id.resource_group().to_string());
            let nic_id = NetworkInterfaceId::network_interface(
                id.subscription(),
                &resource_group,
                &format!("{}-nic", id.name()),
            );
            state.interfaces.insert(
                nic_id.clone(),
                NetworkInterface {
                    id: nic_id.clone(),
                    private_ip_address: Some(format!("10.0.0.{host}")),
                },
            );
            let fqdn = (!spec.disallow_public_ip)
                .then(|| format!("{}.{}.cloudapp.example.net", id.name(), spec.location));
            let pending = VirtualMachine {
                id: id.clone(),
                name: id.name().to_string(),
                location: spec.location.clone(),
                os_type: spec.os_type,
                power_state: PowerState::Running,
                fqdn,
                network_interface: Some(nic_id),
            };
            state.machines.insert(id.clone(), pending.clone());
            VirtualMachine {
                id: id.in_resource_group(&resource_group),
                ..pending
            }
        };

        let machine = self.complete(never_complete, poll, cancel, machine).await?;

        let mut state = self.state.lock();
        state.machines.remove(id);
        for artifact in &spec.artifacts {
            state
                .applied_artifacts
                .push((machine.id.clone(), artifact.clone()));
        }
        state.machines.insert(machine.id.clone(), machine.clone());
        Ok(machine)
    }

    async fn get_virtual_machine(
        &self,
        id: &VirtualMachineId,
    ) -> Result<VirtualMachine, RemoteError> {
        self.begin(Operation::GetVirtualMachine)?;
        self.state
            .lock()
            .machines
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("virtual machine", id))
    }

    async fn stop_virtual_machine(
        &self,
        id: &VirtualMachineId,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<(), RemoteError> {
        let never_complete = self.begin(Operation::StopVirtualMachine)?;
        if !self.state.lock().machines.contains_key(id) {
            return Err(not_found("virtual machine", id));
        }

        self.complete(never_complete, poll, cancel, ()).await?;

        if let Some(machine) = self.state.lock().machines.get_mut(id) {
            machine.power_state = PowerState::Stopped;
        }
        Ok(())
    }

    async fn delete_virtual_machine(
        &self,
        id: &VirtualMachineId,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<(), RemoteError> {
        let never_complete = self.begin(Operation::DeleteVirtualMachine)?;
        self.complete(never_complete, poll, cancel, ()).await?;

        let mut state = self.state.lock();
        if let Some(machine) = state.machines.remove(id)
            && let Some(nic) = machine.network_interface
        {
            state.interfaces.remove(&nic);
        }
        Ok(())
    }

    async fn apply_artifacts(
        &self,
        id: &VirtualMachineId,
        artifacts: &[ArtifactInstall],
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<(), RemoteError> {
        let never_complete = self.begin(Operation::ApplyArtifacts)?;
        match self.state.lock().machines.get(id) {
            None => return Err(not_found("virtual machine", id)),
            Some(machine) if machine.power_state != PowerState::Running => {
                return Err(RemoteError::Conflict(format!(
                    "virtual machine {} is not running",
                    machine.name
                )));
            }
            Some(_) => {}
        }

        self.complete(never_complete, poll, cancel, ()).await?;

        let mut state = self.state.lock();
        for artifact in artifacts {
            state.applied_artifacts.push((id.clone(), artifact.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageOps for MemoryLab {
    async fn create_or_update_custom_image(
        &self,
        id: &CustomImageId,
        spec: &CustomImageSpec,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<CustomImage, RemoteError> {
        let never_complete = self.begin(Operation::CreateCustomImage)?;
        let location = self
            .state
            .lock()
            .machines
            .get(&spec.source_vm)
            .map(|m| m.location.clone())
            .ok_or_else(|| not_found("source virtual machine", &spec.source_vm))?;

        let image = CustomImage {
            id: id.clone(),
            location,
            os_type: spec.deprovision.os_type(),
            deprovision: spec.deprovision,
        };
        let image = self.complete(never_complete, poll, cancel, image).await?;

        self.state.lock().images.insert(id.clone(), image.clone());
        Ok(image)
    }

    async fn get_custom_image(&self, id: &CustomImageId) -> Result<CustomImage, RemoteError> {
        self.begin(Operation::GetCustomImage)?;
        self.state
            .lock()
            .images
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("custom image", id))
    }
}

#[async_trait]
impl NetworkOps for MemoryLab {
    async fn get_network_interface(
        &self,
        id: &NetworkInterfaceId,
    ) -> Result<NetworkInterface, RemoteError> {
        self.begin(Operation::GetNetworkInterface)?;
        self.state
            .lock()
            .interfaces
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("network interface", id))
    }
}

#[async_trait]
impl GalleryOps for MemoryLab {
    async fn get_gallery_image(&self, id: &GalleryImageId) -> Result<GalleryImage, RemoteError> {
        self.begin(Operation::GetGalleryImage)?;
        self.state
            .lock()
            .gallery_images
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("gallery image", id))
    }

    async fn create_or_update_gallery_image_version(
        &self,
        id: &GalleryImageVersionId,
        spec: &GalleryImageVersionSpec,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<GalleryImageVersion, RemoteError> {
        let never_complete = self.begin(Operation::CreateGalleryImageVersion)?;
        {
            let state = self.state.lock();
            if !state.images.contains_key(&spec.source_image) {
                return Err(not_found("source image", &spec.source_image));
            }
        }

        let version = GalleryImageVersion {
            id: id.clone(),
            replication_regions: spec.replication_regions.clone(),
        };
        let version = self.complete(never_complete, poll, cancel, version).await?;

        self.state
            .lock()
            .gallery_versions
            .insert(id.clone(), version.clone());
        Ok(version)
    }
}

/// Poll settings that complete in-memory operations quickly.
pub fn fast_poll() -> PollOptions {
    PollOptions::new(Duration::from_millis(1), Duration::from_secs(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_id() -> LabId {
        LabId::lab("sub", "lab-rg", "lab")
    }

    #[tokio::test]
    async fn fail_times_expires() {
        let lab = MemoryLab::default();
        lab.inject(Operation::ListVirtualMachines, Fault::FailTimes(2));

        assert!(lab.list_virtual_machines(&lab_id()).await.is_err());
        assert!(lab.list_virtual_machines(&lab_id()).await.is_err());
        assert!(lab.list_virtual_machines(&lab_id()).await.is_ok());
        assert_eq!(lab.call_count(Operation::ListVirtualMachines), 3);
    }

    #[tokio::test]
    async fn injected_failure_carries_json_body() {
        let lab = MemoryLab::default();
        lab.inject(Operation::GetCustomImage, Fault::FailAlways);

        let err = lab
            .get_custom_image(&lab_id().custom_image("img"))
            .await
            .unwrap_err();
        let body: serde_json::Value = serde_json::from_str(err.diagnostic().unwrap()).unwrap();
        assert_eq!(body["error"]["code"], "InjectedFault");
    }

    #[tokio::test]
    async fn never_complete_times_out() {
        let lab = MemoryLab::default();
        lab.seed_virtual_machine(&lab_id(), "vm", OsType::Linux);
        lab.inject(Operation::StopVirtualMachine, Fault::NeverComplete);

        let poll = PollOptions::new(Duration::from_millis(2), Duration::from_millis(20));
        let err = lab
            .stop_virtual_machine(&lab_id().virtual_machine("vm"), &poll, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let lab = MemoryLab::default();
        let id = lab_id().virtual_machine("missing");
        let cancel = CancellationToken::new();

        lab.delete_virtual_machine(&id, &fast_poll(), &cancel)
            .await
            .unwrap();
        lab.delete_virtual_machine(&id, &fast_poll(), &cancel)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let lab = MemoryLab::default().with_pending_polls(2);
        lab.seed_virtual_machine(&lab_id(), "vm", OsType::Linux);
        let id = lab_id().virtual_machine("vm");
        let cancel = CancellationToken::new();

        lab.stop_virtual_machine(&id, &fast_poll(), &cancel)
            .await
            .unwrap();
        lab.stop_virtual_machine(&id, &fast_poll(), &cancel)
            .await
            .unwrap();
        assert_eq!(
            lab.virtual_machine(&id).unwrap().power_state,
            PowerState::Stopped
        );
    }
}
