// ABOUTME: Virtual machine operations trait for remote labs.
// ABOUTME: List, create, inspect, stop, delete machines and apply artifacts.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::shared_types::{ArtifactInstall, VirtualMachine, VirtualMachineSpec};
use crate::remote::{PollOptions, RemoteError};
use crate::types::{LabId, VirtualMachineId};

/// Lab virtual machine lifecycle operations.
///
/// Pollable operations block until the remote reports a terminal state,
/// `poll.timeout` elapses, or `cancel` fires.
#[async_trait]
pub trait VirtualMachineOps: Send + Sync {
    /// List every machine in a lab.
    async fn list_virtual_machines(&self, lab: &LabId)
    -> Result<Vec<VirtualMachine>, RemoteError>;

    /// Create or update a machine and wait for provisioning to finish.
    async fn create_or_update_virtual_machine(
        &self,
        id: &VirtualMachineId,
        spec: &VirtualMachineSpec,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<VirtualMachine, RemoteError>;

    /// Fetch a machine. Returns `RemoteError::NotFound` if it doesn't exist.
    async fn get_virtual_machine(
        &self,
        id: &VirtualMachineId,
    ) -> Result<VirtualMachine, RemoteError>;

    /// Stop a machine. Stopping a stopped machine succeeds.
    async fn stop_virtual_machine(
        &self,
        id: &VirtualMachineId,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<(), RemoteError>;

    /// Delete a machine. Deleting an absent machine succeeds.
    async fn delete_virtual_machine(
        &self,
        id: &VirtualMachineId,
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<(), RemoteError>;

    /// Install artifacts on a running machine.
    async fn apply_artifacts(
        &self,
        id: &VirtualMachineId,
        artifacts: &[ArtifactInstall],
        poll: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<(), RemoteError>;
}
