//! The side-effecting steps of a service backup.
//!
//! None of these return errors: every failure is recorded on the service
//! state together with the step it happened at, so that one service failing
//! never stops the others.

use crate::{
    context::RunContext,
    exec::{error_chain, CommandRunner, Invocation, Output},
    model::{ContainerAction, ServiceState, Step},
    restic::Restic,
    settings::{Retention, Settings},
};
use std::{path::Path, sync::Arc};

mod backup;
mod size;

#[derive(Debug, Clone)]
pub struct Operations {
    runner: Arc<dyn CommandRunner>,
    restic: Restic,
    docker_binary: String,
    use_sudo: bool,
    user: String,
    retention: Retention,
}

impl Operations {
    pub fn new(runner: Arc<dyn CommandRunner>, context: &RunContext, settings: &Settings) -> Self {
        Operations {
            runner,
            restic: Restic::new(&settings.restic_binary, context.backups_password.clone()),
            docker_binary: settings.docker_binary.clone(),
            use_sudo: settings.use_sudo,
            user: context.user.clone(),
            retention: settings.retention,
        }
    }

    pub fn restic(&self) -> &Restic {
        &self.restic
    }

    /// Runs an invocation and turns a spawn error or a non-zero exit into a
    /// message.
    async fn run_checked(&self, invocation: &Invocation) -> Result<Output, String> {
        match self.runner.run(invocation).await {
            Ok(output) if output.status.success() => Ok(output),
            Ok(output) => Err(match output.diagnostics() {
                "" => output.status.message(),
                diagnostics => diagnostics.to_owned(),
            }),
            Err(e) => Err(error_chain(&e)),
        }
    }

    fn chown(&self, path: &Path) -> Invocation {
        let owner = format!("{0}:{0}", self.user);
        let invocation = if self.use_sudo {
            Invocation::new("sudo").arg("chown")
        } else {
            Invocation::new("chown")
        };
        invocation
            .arg("-R")
            .arg(owner)
            .arg(path.to_string_lossy().into_owned())
    }

    /// Starts or stops the service's containers, in order. The first failure
    /// marks the service failed and skips the remaining containers.
    pub async fn manage_containers(&self, state: &mut ServiceState, action: ContainerAction) {
        let containers = match state.resolved() {
            Some(resolved) if !resolved.containers.is_empty() => resolved.containers.clone(),
            _ => return,
        };

        for container in containers {
            tracing::info!("{} container {}", action.progressive(), container);
            let invocation = Invocation::new(&self.docker_binary)
                .arg(action.as_str())
                .arg(&container);
            if let Err(message) = self.run_checked(&invocation).await {
                state.fail(
                    Step::Docker(action),
                    format!(
                        "Error {} container {}:\n{}",
                        action.progressive(),
                        container,
                        message
                    ),
                );
                return;
            }
        }
    }

    /// Hands the configured paths over to the run user. Stops at the first
    /// failure; later paths keep their ownership.
    pub async fn change_ownership(&self, state: &mut ServiceState) {
        let paths = match state.resolved() {
            Some(resolved) if !resolved.ownership_paths.is_empty() => {
                resolved.ownership_paths.clone()
            }
            _ => return,
        };

        for path in paths {
            tracing::info!(
                "changing ownership of {} to {}:{}",
                path.display(),
                self.user,
                self.user
            );
            if let Err(message) = self.run_checked(&self.chown(&path)).await {
                state.fail(
                    Step::Chown,
                    format!("Error changing ownership of {}:\n{}", path.display(), message),
                );
                return;
            }
        }
        tracing::info!("ownership changed successfully");
    }

    /// Best effort: the backup may run privileged and leave root-owned files
    /// in the repository that the sync process later has to read.
    pub async fn fix_repository_ownership(&self, repo: &Path) {
        tracing::info!("changing repository ownership to {}:{}", self.user, self.user);
        match self.run_checked(&self.chown(repo)).await {
            Ok(_) => tracing::info!("repository ownership changed successfully"),
            Err(message) => {
                tracing::warn!("could not change repository ownership:\n{}", message)
            }
        }
    }
}
