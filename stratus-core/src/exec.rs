//! The seam between stratus and the external tools it drives.
//!
//! Every external program (restic, docker, chown, du) is started through a
//! [`CommandRunner`], which makes the executor testable without any of those
//! tools installed.

use crate::secrets::SecretValue;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, SecretValue)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: SecretValue) -> Self {
        self.env.push((key.into(), value));
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Program and arguments joined for log output. Environment values are
    /// never included.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        for (key, value) in &self.env {
            cmd.env(key, value.expose());
        }
        cmd
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ExitStatus {
    Successful,
    Failed(Option<i32>),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self == &ExitStatus::Successful
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Successful => Some(0),
            ExitStatus::Failed(code) => *code,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ExitStatus::Successful => "exited successfully".to_owned(),
            ExitStatus::Failed(Some(code)) => format!("exited with error status {}", code),
            ExitStatus::Failed(None) => "exited with unknown error status".to_owned(),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Successful
        } else {
            ExitStatus::Failed(status.code())
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(stdout: impl Into<String>) -> Self {
        Output {
            status: ExitStatus::Successful,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Output {
            status: ExitStatus::Failed(Some(code)),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whatever the process printed to explain itself: stderr if there is
    /// any, stdout otherwise.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start {program}")]
    FailedToStart {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error getting status of {program}")]
    SubprocessStatusError {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync + std::fmt::Debug {
    /// Runs the invocation to completion and captures its output.
    async fn run(&self, invocation: &Invocation) -> Result<Output, Error>;
}

#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Runs the invocation with stdout and stderr attached to the terminal.
    pub async fn run_inherited(&self, invocation: &Invocation) -> Result<ExitStatus, Error> {
        tracing::debug!(command = %invocation.command_line(), "running");
        let mut cmd = invocation.to_command();
        cmd.stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        let mut child = cmd.spawn().map_err(|source| Error::FailedToStart {
            program: invocation.program.clone(),
            source,
        })?;
        let status = child
            .wait()
            .await
            .map_err(|source| Error::SubprocessStatusError {
                program: invocation.program.clone(),
                source,
            })?;
        Ok(status.into())
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<Output, Error> {
        tracing::debug!(command = %invocation.command_line(), "running");
        let mut cmd = invocation.to_command();
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd.spawn().map_err(|source| Error::FailedToStart {
            program: invocation.program.clone(),
            source,
        })?;
        let output =
            child
                .wait_with_output()
                .await
                .map_err(|source| Error::SubprocessStatusError {
                    program: invocation.program.clone(),
                    source,
                })?;
        let output = Output {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(program = %invocation.program, status = %output.status.message(), "finished");
        Ok(output)
    }
}

/// Formats an error together with all of its sources, `outer: inner: root`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
