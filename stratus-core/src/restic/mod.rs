//! The restic command contract: how each repository operation is invoked.

use crate::{exec::Invocation, secrets::SecretValue, settings::Retention, tag::Tag};
use std::path::{Path, PathBuf};

mod exit;

pub use exit::{indicates_missing_repository, ExitReason, ResticError};

#[derive(Debug, Clone)]
pub struct Restic {
    binary: String,
    password: SecretValue,
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Restic {
    pub fn new(binary: impl Into<String>, password: SecretValue) -> Self {
        Restic {
            binary: binary.into(),
            password,
        }
    }

    /// A bare invocation without a repository, e.g. for `version`.
    pub fn bare(&self) -> Invocation {
        Invocation::new(&self.binary)
    }

    /// The passphrase goes into the environment, never onto the command line.
    pub fn with_repo(&self, repo: &Path) -> Invocation {
        Invocation::new(&self.binary)
            .env("RESTIC_PASSWORD", self.password.clone())
            .arg("--repo")
            .arg(path_arg(repo))
    }

    pub fn cat_config(&self, repo: &Path) -> Invocation {
        self.with_repo(repo).args(["cat", "config"])
    }

    pub fn init(&self, repo: &Path) -> Invocation {
        self.with_repo(repo).arg("init")
    }

    pub fn check(&self, repo: &Path) -> Invocation {
        self.with_repo(repo).arg("check")
    }

    pub fn backup(&self, repo: &Path, name: &str, paths: &[PathBuf]) -> Invocation {
        self.with_repo(repo)
            .arg("backup")
            .args(paths.iter().map(|p| path_arg(p)))
            .arg("--tag")
            .arg(Tag::for_service(name).0)
    }

    /// Grouping by paths and tags keeps a service's history in one lineage
    /// even if the hostname changes.
    pub fn forget(&self, repo: &Path, retention: &Retention) -> Invocation {
        self.with_repo(repo)
            .args(["forget", "--prune"])
            .arg("--keep-daily")
            .arg(retention.keep_daily.to_string())
            .arg("--keep-weekly")
            .arg(retention.keep_weekly.to_string())
            .arg("--keep-monthly")
            .arg(retention.keep_monthly.to_string())
            .args(["--group-by", "paths,tags"])
    }
}
