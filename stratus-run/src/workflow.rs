use crate::guard::ContainerGuard;
use futures::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe, path::PathBuf, time::Instant};
use stratus_core::{
    model::{ServiceState, Step},
    ops::Operations,
};

/// Everything that happens to one service during a run.
///
/// Implementations record their outcome on the state and never fail the run
/// as a whole. The orchestrator calls them one at a time, but nothing in the
/// contract depends on that.
#[async_trait::async_trait]
pub trait Workflow: Send + Sync {
    async fn run(&self, state: &mut ServiceState);
}

#[derive(Debug, Clone)]
pub struct BackupWorkflow {
    ops: Operations,
    output_base: PathBuf,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

impl BackupWorkflow {
    pub fn new(ops: Operations, output_base: impl Into<PathBuf>) -> Self {
        BackupWorkflow {
            ops,
            output_base: output_base.into(),
        }
    }

    async fn steps(&self, guard: &ContainerGuard<'_>, state: &mut ServiceState) {
        guard.stop(state).await;
        if state.is_failed() {
            return;
        }
        self.ops.change_ownership(state).await;
        if state.is_failed() {
            return;
        }
        self.ops.perform_backup(state, &self.output_base).await;
    }
}

#[async_trait::async_trait]
impl Workflow for BackupWorkflow {
    /// Stop containers, hand ownership to the run user, back up. Containers
    /// are restarted afterwards no matter how far that got, including when
    /// one of the steps panicked.
    async fn run(&self, state: &mut ServiceState) {
        let start = Instant::now();
        let guard = ContainerGuard::new(&self.ops, state);

        let outcome = AssertUnwindSafe(self.steps(&guard, state))
            .catch_unwind()
            .await
            .map_err(|payload| panic_message(payload.as_ref()));
        if let Err(message) = outcome {
            state.fail(Step::Workflow, format!("Unexpected error: {}", message));
        }

        guard.release(state).await;
        state.duration = Some(start.elapsed());
    }
}
