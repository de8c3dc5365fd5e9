// ABOUTME: Power-off step: stop the build machine before capture.
// ABOUTME: Stopping an already stopped machine is the client's concern.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{StepContext, machine_id};
use crate::pipeline::{Action, StateBag, Step, StepError, halt};
use crate::remote::LabClient;

const NAME: &str = "power-off";

pub struct PowerOffStep<C> {
    ctx: StepContext<C>,
}

impl<C: LabClient> PowerOffStep<C> {
    pub fn new(ctx: StepContext<C>) -> Self {
        Self { ctx }
    }

    async fn power_off(
        &self,
        cancel: &CancellationToken,
        state: &StateBag,
    ) -> Result<(), StepError> {
        let id = machine_id(state)?;
        self.ctx
            .reporter
            .say(&format!("Powering off virtual machine {}", id.name()));
        self.ctx
            .reporter
            .say(&format!(" -> Resource group: {}", id.resource_group()));

        self.ctx
            .client
            .stop_virtual_machine(&id, &self.ctx.config.polling.deployment(), cancel)
            .await
            .map_err(|e| StepError::remote("power off virtual machine", e))?;

        self.ctx.reporter.say(" -> Virtual machine stopped");
        Ok(())
    }
}

#[async_trait]
impl<C: LabClient + 'static> Step for PowerOffStep<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> Action {
        match self.power_off(cancel, state).await {
            Ok(()) => Action::Continue,
            Err(err) => halt(NAME, self.ctx.reporter.as_ref(), state, err),
        }
    }
}
