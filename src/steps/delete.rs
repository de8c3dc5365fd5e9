// ABOUTME: Delete step: remove the build machine once the image is captured.
// ABOUTME: Records vm-deleted so deploy's cleanup doesn't delete twice.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{StepContext, machine_id};
use crate::pipeline::{Action, StateBag, Step, StepError, halt, keys};
use crate::remote::LabClient;

const NAME: &str = "delete";

pub struct DeleteStep<C> {
    ctx: StepContext<C>,
}

impl<C: LabClient> DeleteStep<C> {
    pub fn new(ctx: StepContext<C>) -> Self {
        Self { ctx }
    }

    async fn delete(
        &self,
        cancel: &CancellationToken,
        state: &mut StateBag,
    ) -> Result<(), StepError> {
        let id = machine_id(state)?;
        self.ctx
            .reporter
            .say(&format!("Deleting virtual machine {}", id.name()));

        self.ctx
            .client
            .delete_virtual_machine(&id, &self.ctx.config.polling.deployment(), cancel)
            .await
            .map_err(|e| StepError::remote("delete virtual machine", e))?;

        state.put(keys::VM_DELETED, true);
        self.ctx.reporter.say(" -> Virtual machine deleted");
        Ok(())
    }
}

#[async_trait]
impl<C: LabClient + 'static> Step for DeleteStep<C> {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, cancel: &CancellationToken, state: &mut StateBag) -> Action {
        match self.delete(cancel, state).await {
            Ok(()) => Action::Continue,
            Err(err) => halt(NAME, self.ctx.reporter.as_ref(), state, err),
        }
    }
}
