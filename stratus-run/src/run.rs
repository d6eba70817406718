use crate::workflow::Workflow;
use std::{collections::HashSet, time::Instant};
use stratus_core::{
    config::{discover, validate_and_normalize, DiscoverError},
    context::RunContext,
    model::{RunResult, ServiceState},
    ops::Operations,
};
use tracing::Instrument;

/// Finds and validates every service spec. Specs that fail validation stay
/// in the list, marked failed.
pub async fn load(context: &RunContext) -> Result<Vec<ServiceState>, DiscoverError> {
    let mut states = discover(&context.spec_dirs).await?;
    for state in &mut states {
        validate_and_normalize(state, context);
    }
    for name in shared_repositories(&states) {
        tracing::warn!(
            "{} shares its repository with another service, set dest-name to keep them apart",
            name
        );
    }
    Ok(states)
}

/// Display names of services whose repository was already claimed by an
/// earlier service.
fn shared_repositories(states: &[ServiceState]) -> Vec<String> {
    let mut seen = HashSet::new();
    states
        .iter()
        .filter(|state| !seen.insert(state.repository_name()))
        .map(ServiceState::display_name)
        .collect()
}

/// Runs every discovered service through a workflow, one after the other.
#[derive(Debug)]
pub struct Orchestrator<'a, W> {
    context: &'a RunContext,
    ops: Operations,
    workflow: W,
}

impl<'a, W: Workflow> Orchestrator<'a, W> {
    pub fn new(context: &'a RunContext, ops: Operations, workflow: W) -> Self {
        Orchestrator {
            context,
            ops,
            workflow,
        }
    }

    async fn run_service(&self, state: &mut ServiceState) {
        if state.is_failed() {
            tracing::warn!("skipping, configuration is invalid");
            return;
        }
        tracing::info!("starting backup");
        self.workflow.run(state).await;
        state.complete();
        match state.failure() {
            None => tracing::info!("backup finished successfully"),
            Some(failure) => tracing::error!("backup failed at step {}", failure.step),
        }
    }

    /// Only an unreadable spec directory fails the whole run; everything
    /// that goes wrong for a single service ends up in the result.
    pub async fn run(&self) -> Result<RunResult, DiscoverError> {
        let start = Instant::now();
        let mut states = load(self.context).await?;
        if states.is_empty() {
            tracing::warn!(
                "no service specs found in {}",
                self.context
                    .spec_dirs
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Ok(RunResult::empty(start.elapsed()));
        }
        tracing::info!("found {} service(s)", states.len());

        for state in states.iter_mut() {
            let span = tracing::info_span!("service", name = %state.display_name());
            self.run_service(state).instrument(span).await;
        }

        self.ops
            .calculate_repository_sizes(&mut states, &self.context.backups_path)
            .await;

        Ok(RunResult::new(states, start.elapsed()))
    }
}
