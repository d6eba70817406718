use super::Operations;
use crate::{
    exec::{Invocation, Output},
    model::{ResticStep, ServiceState, Step},
    restic::ResticError,
};
use std::path::Path;

impl Operations {
    async fn run_restic(&self, invocation: &Invocation) -> Result<Output, ResticError> {
        let output = self.runner.run(invocation).await?;
        ResticError::check(output)
    }

    /// Runs one lifecycle step and records a failure against it.
    async fn restic_step(
        &self,
        state: &mut ServiceState,
        step: ResticStep,
        invocation: Invocation,
    ) -> bool {
        match self.run_restic(&invocation).await {
            Ok(_) => true,
            Err(e) => {
                state.fail(Step::Restic(step), e.message());
                false
            }
        }
    }

    /// Makes sure there is a usable repository at `repo`, creating one if
    /// the existence check says there is none.
    async fn ensure_repository(&self, state: &mut ServiceState, repo: &Path) -> bool {
        tracing::info!("checking repository {}", repo.display());
        let check = self.restic.cat_config(repo);
        match self.run_restic(&check).await {
            Ok(_) => return true,
            Err(e) if e.indicates_missing_repository() => {
                tracing::info!("no repository at {}, initializing", repo.display());
                tracing::debug!("existence check said: {}", e.message());
            }
            Err(e) => {
                state.fail(Step::Restic(ResticStep::Check), e.message());
                return false;
            }
        }

        self.restic_step(state, ResticStep::Init, self.restic.init(repo))
            .await
            && self
                .restic_step(state, ResticStep::Check, self.restic.cat_config(repo))
                .await
    }

    /// The repository lifecycle for one service: existence check (with lazy
    /// init), integrity check, snapshot, retention, integrity check again.
    /// The first failing step ends the lifecycle.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn perform_backup(&self, state: &mut ServiceState, output_base: &Path) {
        if state.is_failed() {
            return;
        }
        let resolved = match state.resolved() {
            Some(resolved) => resolved.clone(),
            None => {
                state.fail(Step::Workflow, "service was not validated before backup");
                return;
            }
        };
        let repo = output_base.join(&resolved.dest_name);

        if !self.ensure_repository(state, &repo).await {
            return;
        }

        tracing::info!("checking repository integrity");
        if !self
            .restic_step(state, ResticStep::CheckIntegrityBefore, self.restic.check(&repo))
            .await
        {
            return;
        }

        tracing::info!("backing up {} path(s)", resolved.source_paths.len());
        let backup = self
            .restic
            .backup(&repo, &resolved.name, &resolved.source_paths);
        if !self.restic_step(state, ResticStep::Backup, backup).await {
            return;
        }

        tracing::info!("applying retention policy");
        let forget = self.restic.forget(&repo, &self.retention);
        if !self.restic_step(state, ResticStep::Forget, forget).await {
            return;
        }

        tracing::info!("checking repository integrity after backup");
        if !self
            .restic_step(state, ResticStep::CheckIntegrityAfter, self.restic.check(&repo))
            .await
        {
            return;
        }

        self.fix_repository_ownership(&repo).await;
    }
}
