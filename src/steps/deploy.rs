// ABOUTME: Deploy step: create the transient lab machine and make it reachable.
// ABOUTME: Checks for name collisions, resolves the connect host, enables WinRM on Windows.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{StepContext, build_tags, machine_id};
use crate::config::AdminConfig;
use crate::pipeline::{Action, StateBag, Step, StepError, halt, keys, retry_with_backoff};
use crate::remote::{
    ArtifactInstall, LabClient, OsType, SourceImage, VirtualMachine, VirtualMachineSpec,
};
use crate::types::{LabId, TempNames, VirtualMachineId};

const NAME: &str = "deploy";

/// Lab artifact that opens WinRM on a Windows machine.
pub const WINRM_ARTIFACT: &str = "windows-enable-winrm";

/// Admin account the machine is created with.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
    pub ssh_public_key: Option<String>,
}

impl Credentials {
    /// Resolve configured credentials, falling back to the generated password.
    ///
    /// Linux machines with an SSH key only get a password if one is configured.
    pub fn resolve(
        admin: &AdminConfig,
        os_type: OsType,
        names: &TempNames,
    ) -> crate::error::Result<Self> {
        let configured = admin.password.as_ref().map(|p| p.resolve()).transpose()?;
        let ssh_public_key = match os_type {
            OsType::Linux => admin.ssh_public_key.clone(),
            OsType::Windows => None,
        };

        let password = match (configured, &ssh_public_key) {
            (Some(password), _) => Some(password),
            (None, Some(_)) => None,
            (None, None) => Some(names.admin_password.clone()),
        };

        Ok(Self {
            username: admin.username.clone(),
            password,
            ssh_public_key,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssh_public_key", &self.ssh_public_key.is_some())
            .finish()
    }
}

pub struct DeployStep<C> {
    ctx: StepContext<C>,
    credentials: Credentials,
    image: SourceImage,
}

impl<C: LabClient> DeployStep<C> {
    pub fn new(ctx: StepContext<C>, credentials: Credentials, image: SourceImage) -> Self {
        Self {
            ctx,
            credentials,
            image,
        }
    }

    async fn deploy(
        &self,
        cancel: &CancellationToken,
        state: &mut StateBag,
    ) -> Result<(), StepError> {
        let config = &self.ctx.config;
        let reporter = &self.ctx.reporter;

        let compute_name = state.get(keys::COMPUTE_NAME)?.clone();
        let lab = LabId::lab(
            state.get(keys::SUBSCRIPTION_ID)?,
            state.get(keys::RESOURCE_GROUP_NAME)?,
            state.get(keys::LAB_NAME)?,
        );

        reporter.say(&format!(
            "Deploying virtual machine {compute_name} in lab {}",
            lab.name()
        ));
        reporter.say(&format!(" -> Deployment: {}", state.get(keys::DEPLOYMENT_NAME)?));
        reporter.say(&format!(" -> Location: {}", config.location));
        reporter.say(&format!(" -> Size: {}", config.vm_size));
        reporter.say(&format!(" -> OS: {}", config.os_type));
        reporter.say(&format!(" -> Image: {}", describe_image(&self.image)));

        let existing = self
            .ctx
            .client
            .list_virtual_machines(&lab)
            .await
            .map_err(|e| StepError::remote("list lab virtual machines", e))?;
        if existing
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(&compute_name))
        {
            return Err(StepError::NameCollision(compute_name));
        }

        let id = lab.virtual_machine(&compute_name);
        let spec = self.machine_spec();
        // A timed-out or cancelled create may still leave a machine behind.
        state.put(keys::VM_CREATE_SUBMITTED, true);
        let machine = self
            .ctx
            .client
            .create_or_update_virtual_machine(&id, &spec, &config.polling.deployment(), cancel)
            .await
            .map_err(|e| StepError::remote("deploy virtual machine", e))?;

        state.put(keys::VM_CREATED, true);
        state.put(keys::RESOURCE_GROUP_NAME, machine.resource_group().to_string());
        info!(vm = %machine.id, "virtual machine created");

        let host = self.connect_host(&machine).await?;
        reporter.say(&format!(" -> Connect host: {host}"));
        state.put(keys::CONNECT_HOST, host);

        if config.os_type == OsType::Windows {
            self.enable_winrm(&machine.id, cancel).await?;
        }

        reporter.say(&format!(
            "Virtual machine {compute_name} deployed to resource group {}",
            machine.resource_group()
        ));
        Ok(())
    }

    fn machine_spec(&self) -> VirtualMachineSpec {
        let config = &self.ctx.config;
        VirtualMachineSpec {
            location: config.location.clone(),
            size: config.vm_size.clone(),
            os_type: config.os_type,
            image: self.image.clone(),
            admin_username: self.credentials.username.clone(),
            admin_password: self.credentials.password.clone(),
            ssh_public_key: self.credentials.ssh_public_key.clone(),
            lab_virtual_network: config.lab_virtual_network(),
            lab_subnet: config.lab_subnet(),
            disallow_public_ip: config.network.disallow_public_ip,
            storage_type: config.storage_type,
            artifacts: config.artifacts.clone(),
            tags: build_tags(config),
        }
    }

    /// Private address when public addressing is disallowed, FQDN otherwise.
    async fn connect_host(&self, machine: &VirtualMachine) -> Result<String, StepError> {
        if !self.ctx.config.network.disallow_public_ip {
            return machine.fqdn.clone().ok_or_else(|| {
                StepError::MissingPrerequisite(format!(
                    "virtual machine {} has no public FQDN",
                    machine.name
                ))
            });
        }

        let nic_id = machine.network_interface.as_ref().ok_or_else(|| {
            StepError::MissingPrerequisite(format!(
                "virtual machine {} has no network interface",
                machine.name
            ))
        })?;
        let nic = self
            .ctx
            .client
            .get_network_interface(nic_id)
            .await
            .map_err(|e| StepError::remote("read network interface", e))?;

        nic.private_ip_address.ok_or_else(|| {
            StepError::MissingPrerequisite(format!(
                "network interface {} has no private IP address",
                nic.id.name()
            ))
        })
    }

    async fn enable_winrm(
        &self,
        id: &VirtualMachineId,
        cancel: &CancellationToken,
    ) -> Result<(), StepError> {
        let policy = &self.ctx.config.winrm_retry;
        let client = self.ctx.client.as_ref();
        let reporter = self.ctx.reporter.as_ref();
        let artifacts = [ArtifactInstall::new(WINRM_ARTIFACT)];
        let artifacts = &artifacts[..];
        let poll = self.ctx.config.polling.deployment();
        let poll = &poll;

        reporter.say("Enabling WinRM");
        retry_with_backoff(policy, cancel, "enable WinRM", move |attempt| {
            if attempt > 1 {
                reporter.say(&format!(
                    " -> Retrying WinRM (attempt {attempt}/{})",
                    policy.max_attempts
                ));
            }
            debug!(attempt, "applying WinRM artifact");
            client.apply_artifacts(id, artifacts, poll, cancel)
        })
        .await?;

        reporter.say(" -> WinRM enabled");
        Ok(())
    }
}

fn describe_image(image: &SourceImage) -> String {
    match image {
        SourceImage::Marketplace(m) => {
            format!("{}:{}:{}:{}", m.publisher, m.offer, m.sku, m.version)
        }
        SourceImage::Custom(id) => id.name().to_string(),
    }
}

#[async_trait]
impl<C: LabClient + 'static> Step for DeployStep<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> Action {
        match self.deploy(cancel, state).await {
            Ok(()) => Action::Continue,
            Err(err) => halt(NAME, self.ctx.reporter.as_ref(), state, err),
        }
    }

    /// Delete the machine this build asked for, unless the delete step already did.
    ///
    /// Runs whenever the create request was sent, even if it never reported
    /// success; deleting a machine that does not exist is a no-op.
    async fn cleanup(&self, state: &mut StateBag) -> Result<(), StepError> {
        if !state.flag(keys::VM_CREATE_SUBMITTED) || state.flag(keys::VM_DELETED) {
            return Ok(());
        }

        let id = machine_id(state)?;
        self.ctx
            .reporter
            .say(&format!("Cleaning up virtual machine {}", id.name()));

        // The build token may already be cancelled; cleanup must still finish.
        let poll = self.ctx.config.polling.deployment();
        self.ctx
            .client
            .delete_virtual_machine(&id, &poll, &CancellationToken::new())
            .await
            .map_err(|e| StepError::remote("delete virtual machine", e))?;

        state.put(keys::VM_DELETED, true);
        Ok(())
    }
}
