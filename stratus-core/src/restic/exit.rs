use crate::exec::{self, ExitStatus, Output};

/// Why restic exited unsuccessfully, from its documented exit codes.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ExitReason {
    Failed,
    InternalError,
    /// Some source data could not be read. The snapshot is incomplete, so
    /// this counts as a failure of the whole step.
    PartialRead,
    RepositoryMissing,
    Locked,
    WrongPassword,
    Interrupted,
    Other(i32),
    /// Killed by a signal, no exit code.
    Terminated,
}

impl ExitReason {
    pub fn from_status(status: ExitStatus) -> Option<Self> {
        match status {
            ExitStatus::Successful => None,
            ExitStatus::Failed(Some(code)) => Some(Self::from_code(code)),
            ExitStatus::Failed(None) => Some(ExitReason::Terminated),
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ExitReason::Failed,
            2 => ExitReason::InternalError,
            3 => ExitReason::PartialRead,
            10 => ExitReason::RepositoryMissing,
            11 => ExitReason::Locked,
            12 => ExitReason::WrongPassword,
            130 => ExitReason::Interrupted,
            code => ExitReason::Other(code),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ExitReason::Failed => "restic command failed (code 1)".to_owned(),
            ExitReason::InternalError => "restic internal error (code 2)".to_owned(),
            ExitReason::PartialRead => "backup could not read some source data (code 3)".to_owned(),
            ExitReason::RepositoryMissing => "repository does not exist (code 10)".to_owned(),
            ExitReason::Locked => "failed to lock repository (code 11)".to_owned(),
            ExitReason::WrongPassword => "wrong password for repository (code 12)".to_owned(),
            ExitReason::Interrupted => "restic was interrupted (code 130)".to_owned(),
            ExitReason::Other(code) => format!("restic failed with exit code {}", code),
            ExitReason::Terminated => "restic was terminated without an exit code".to_owned(),
        }
    }
}

const MISSING_REPOSITORY_MARKERS: &[&str] = &[
    "is not a restic repository",
    "does not exist",
    "no such file or directory",
];

/// Decides whether a failed existence check means "there is no repository
/// yet" and it is safe to initialize one.
///
/// Exit code 10 is the structured signal; older restic versions exit with 1
/// and only say so in their output, which is matched heuristically. The
/// marker strings depend on the restic version. A wrong password or a locked
/// repository never counts: the repository exists, and initializing over it
/// would be unsafe.
pub fn indicates_missing_repository(reason: ExitReason, output: &str) -> bool {
    match reason {
        ExitReason::RepositoryMissing => true,
        ExitReason::WrongPassword | ExitReason::Locked | ExitReason::Interrupted => false,
        _ => {
            let output = output.to_lowercase();
            MISSING_REPOSITORY_MARKERS
                .iter()
                .any(|marker| output.contains(marker))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResticError {
    #[error(transparent)]
    Exec(#[from] exec::Error),
    #[error("{}", describe(.reason, .output))]
    Exit { reason: ExitReason, output: Output },
}

fn describe(reason: &ExitReason, output: &Output) -> String {
    match output.diagnostics() {
        "" => reason.message(),
        diagnostics => format!("{}: {}", reason.message(), diagnostics),
    }
}

impl ResticError {
    pub fn check(output: Output) -> Result<Output, ResticError> {
        match ExitReason::from_status(output.status) {
            None => Ok(output),
            Some(reason) => Err(ResticError::Exit { reason, output }),
        }
    }

    pub fn indicates_missing_repository(&self) -> bool {
        match self {
            ResticError::Exit { reason, output } => {
                indicates_missing_repository(*reason, &format!("{}\n{}", output.stderr, output.stdout))
            }
            ResticError::Exec(_) => false,
        }
    }

    pub fn message(&self) -> String {
        exec::error_chain(self)
    }
}
