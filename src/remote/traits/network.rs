// ABOUTME: Network operations trait for remote labs.
// ABOUTME: Resolves network interfaces attached to lab machines.

use async_trait::async_trait;

use super::shared_types::NetworkInterface;
use crate::remote::RemoteError;
use crate::types::NetworkInterfaceId;

/// Virtual network operations.
#[async_trait]
pub trait NetworkOps: Send + Sync {
    /// Fetch a network interface and its private address.
    async fn get_network_interface(
        &self,
        id: &NetworkInterfaceId,
    ) -> Result<NetworkInterface, RemoteError>;
}
