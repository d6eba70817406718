use super::BYTES_PER_GB;
use crate::config::{ResolvedSpec, ServiceSpec};
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Status {
    InProgress,
    Success,
    Error,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::InProgress)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ContainerAction {
    Start,
    Stop,
}

impl ContainerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
        }
    }

    pub fn progressive(&self) -> &'static str {
        match self {
            ContainerAction::Start => "starting",
            ContainerAction::Stop => "stopping",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ResticStep {
    Check,
    Init,
    CheckIntegrityBefore,
    Backup,
    Forget,
    CheckIntegrityAfter,
}

impl ResticStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResticStep::Check => "check",
            ResticStep::Init => "init",
            ResticStep::CheckIntegrityBefore => "check_integrity_before",
            ResticStep::Backup => "backup",
            ResticStep::Forget => "forget",
            ResticStep::CheckIntegrityAfter => "check_integrity_after",
        }
    }
}

/// The pipeline step a service failed at.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Step {
    Config,
    Docker(ContainerAction),
    Chown,
    Restic(ResticStep),
    Workflow,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Config => f.write_str("config"),
            Step::Docker(action) => write!(f, "docker_{}", action.as_str()),
            Step::Chown => f.write_str("chown"),
            Step::Restic(step) => write!(f, "restic_{}", step.as_str()),
            Step::Workflow => f.write_str("workflow"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Failure {
    pub step: Step,
    pub message: String,
}

/// Outcome of measuring a repository on disk. Independent of the backup
/// status: a failed service can still have a size, and vice versa.
#[derive(Debug, PartialEq, Clone)]
pub enum RepoSize {
    Measured { bytes: u64 },
    Error(String),
}

impl RepoSize {
    pub fn gb(&self) -> Option<f64> {
        match self {
            RepoSize::Measured { bytes } => Some(*bytes as f64 / BYTES_PER_GB),
            RepoSize::Error(_) => None,
        }
    }
}

/// Per-service state for a single run.
#[derive(Debug, Clone)]
pub struct ServiceState {
    file: PathBuf,
    spec: ServiceSpec,
    resolved: Option<ResolvedSpec>,
    status: Status,
    failures: Vec<Failure>,
    pub size: Option<RepoSize>,
    pub duration: Option<Duration>,
}

impl ServiceState {
    pub fn loaded(file: impl Into<PathBuf>, spec: ServiceSpec) -> Self {
        ServiceState {
            file: file.into(),
            spec,
            resolved: None,
            status: Status::InProgress,
            failures: Vec::new(),
            size: None,
            duration: None,
        }
    }

    /// A state for a spec file that could not be loaded at all.
    pub fn invalid(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        let mut state = Self::loaded(file, ServiceSpec::default());
        state.fail(Step::Config, message);
        state
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    pub fn resolved(&self) -> Option<&ResolvedSpec> {
        self.resolved.as_ref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_failed(&self) -> bool {
        self.status == Status::Error
    }

    /// The first failure, which is what aborted the workflow.
    pub fn failure(&self) -> Option<&Failure> {
        self.failures.first()
    }

    /// All failures, including those recorded after the first one (a failed
    /// container restart after a failed backup, for example).
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.to_string_lossy().into_owned())
    }

    pub fn display_name(&self) -> String {
        match (&self.resolved, &self.spec.name) {
            (Some(resolved), _) => resolved.name.clone(),
            (None, Some(name)) if !name.is_empty() => name.clone(),
            _ => self.file_name(),
        }
    }

    /// Name of the repository directory under the backups base path.
    pub fn repository_name(&self) -> String {
        match &self.resolved {
            Some(resolved) => resolved.dest_name.clone(),
            None => self
                .spec
                .dest_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| self.display_name()),
        }
    }

    pub(crate) fn resolve(&mut self, resolved: ResolvedSpec) {
        self.resolved = Some(resolved);
    }

    /// Records a failure. The status only ever moves forward: a service that
    /// already succeeded keeps its status and the failure is logged only.
    pub fn fail(&mut self, step: Step, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("[{}] {}", step.to_string().to_uppercase(), message);
        if self.status == Status::Success {
            tracing::warn!(service = %self.display_name(), "ignoring failure of a completed service");
            return;
        }
        self.status = Status::Error;
        self.failures.push(Failure { step, message });
    }

    /// Promotes a service that went through its workflow without failing.
    pub fn complete(&mut self) {
        if self.status == Status::InProgress {
            self.status = Status::Success;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ServiceSpec {
        ServiceSpec {
            name: Some(name.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn should_format_steps() {
        assert_eq!(Step::Config.to_string(), "config");
        assert_eq!(
            Step::Docker(ContainerAction::Stop).to_string(),
            "docker_stop"
        );
        assert_eq!(Step::Chown.to_string(), "chown");
        assert_eq!(
            Step::Restic(ResticStep::CheckIntegrityBefore).to_string(),
            "restic_check_integrity_before"
        );
        assert_eq!(Step::Workflow.to_string(), "workflow");
    }

    #[test]
    fn should_start_in_progress() {
        let state = ServiceState::loaded("/specs/web.backup.toml", spec("web"));

        assert_eq!(state.status(), Status::InProgress);
        assert!(!state.status().is_terminal());
    }

    #[test]
    fn should_complete_in_progress_service() {
        let mut state = ServiceState::loaded("/specs/web.backup.toml", spec("web"));

        state.complete();

        assert_eq!(state.status(), Status::Success);
    }

    #[test]
    fn should_not_complete_failed_service() {
        let mut state = ServiceState::loaded("/specs/web.backup.toml", spec("web"));
        state.fail(Step::Chown, "permission denied");

        state.complete();

        assert_eq!(state.status(), Status::Error);
        assert_eq!(
            state.failure(),
            Some(&Failure {
                step: Step::Chown,
                message: "permission denied".to_owned()
            })
        );
    }

    #[test]
    fn should_keep_first_failure_and_collect_later_ones() {
        let mut state = ServiceState::loaded("/specs/web.backup.toml", spec("web"));

        state.fail(Step::Restic(ResticStep::Backup), "backup failed");
        state.fail(Step::Docker(ContainerAction::Start), "no such container");

        assert_eq!(state.failure().unwrap().step, Step::Restic(ResticStep::Backup));
        assert_eq!(state.failures().len(), 2);
    }

    #[test]
    fn should_not_fail_completed_service() {
        let mut state = ServiceState::loaded("/specs/web.backup.toml", spec("web"));
        state.complete();

        state.fail(Step::Workflow, "too late");

        assert_eq!(state.status(), Status::Success);
        assert!(state.failures().is_empty());
    }

    #[test]
    fn should_use_file_name_for_invalid_spec() {
        let state = ServiceState::invalid("/specs/broken.backup.toml", "parse error");

        assert_eq!(state.display_name(), "broken.backup.toml");
        assert_eq!(state.status(), Status::Error);
        assert_eq!(state.failure().unwrap().step, Step::Config);
    }

    #[test]
    fn should_prefer_dest_name_for_repository() {
        let state = ServiceState::loaded(
            "/specs/gatus.backup.toml",
            ServiceSpec {
                name: Some("gatus".to_owned()),
                dest_name: Some("gatus-home".to_owned()),
                ..Default::default()
            },
        );

        assert_eq!(state.repository_name(), "gatus-home");
        assert_eq!(state.display_name(), "gatus");
    }

    #[test]
    fn should_convert_bytes_to_gb() {
        let size = RepoSize::Measured {
            bytes: 3 * 1024 * 1024 * 1024,
        };

        assert_eq!(size.gb(), Some(3.0));
        assert_eq!(RepoSize::Error("Repository not found".to_owned()).gb(), None);
    }
}
