use crate::secrets::SecretValue;
use std::path::{Path, PathBuf};

/// Everything a run needs to know about its environment. Built once at
/// startup and passed by reference; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub server_name: String,
    pub user: String,
    /// Base directory under which every service repository lives.
    pub backups_path: PathBuf,
    pub backups_password: SecretValue,
    pub volumes_path: PathBuf,
    pub apps_path: PathBuf,
    pub media_path: Option<PathBuf>,
    pub sync_path: Option<PathBuf>,
    /// Directories scanned for service spec files, in order.
    pub spec_dirs: Vec<PathBuf>,
    pub ntfy_url: Option<String>,
    pub ntfy_token: Option<SecretValue>,
    pub healthchecks_url: Option<String>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("unknown placeholder '${{{0}}}'")]
    UnknownPlaceholder(String),
    #[error("placeholder '${{{0}}}' is not set")]
    UnsetPlaceholder(String),
    #[error("unterminated placeholder in '{0}'")]
    Unterminated(String),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} must be an absolute path, got {}", .1.display())]
    RelativePath(&'static str, PathBuf),
}

impl RunContext {
    /// Rejects a context that would make every backup fail the same way.
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.user.is_empty() {
            return Err(ContextError::Missing("USER"));
        }
        if self.backups_password.expose().is_empty() {
            return Err(ContextError::Missing("BACKUPS_PASSWORD"));
        }
        let paths = [
            ("PATH_BACKUPS", Some(&self.backups_path)),
            ("VOLUMES_PATH", Some(&self.volumes_path)),
            ("PATH_APPS", Some(&self.apps_path)),
            ("PATH_MEDIA", self.media_path.as_ref()),
            ("PATH_SYNC", self.sync_path.as_ref()),
        ];
        for (name, path) in paths {
            if let Some(path) = path.filter(|p| !p.is_absolute()) {
                return Err(ContextError::RelativePath(name, path.clone()));
            }
        }
        Ok(())
    }

    pub fn default_spec_dirs(apps_path: &Path) -> Vec<PathBuf> {
        vec![
            apps_path.join("stacks"),
            apps_path.join("configs").join("backup"),
        ]
    }

    pub fn home_dir(&self) -> PathBuf {
        Path::new("/home").join(&self.user)
    }

    pub fn repository_path(&self, dest_name: &str) -> PathBuf {
        self.backups_path.join(dest_name)
    }

    fn placeholder(&self, name: &str) -> Result<String, ExpandError> {
        let path = match name {
            "VOLUMES_PATH" => Some(&self.volumes_path),
            "PATH_APPS" => Some(&self.apps_path),
            "PATH_MEDIA" => self.media_path.as_ref(),
            "PATH_SYNC" => self.sync_path.as_ref(),
            "USER" => return Ok(self.user.clone()),
            _ => return Err(ExpandError::UnknownPlaceholder(name.to_owned())),
        };
        path.map(|p| p.to_string_lossy().into_owned())
            .ok_or_else(|| ExpandError::UnsetPlaceholder(name.to_owned()))
    }

    /// Expands a leading `~/` and any `${NAME}` placeholders in a path from a
    /// service spec.
    pub fn expand(&self, raw: &str) -> Result<PathBuf, ExpandError> {
        let mut expanded = String::with_capacity(raw.len());
        let mut rest = match raw.strip_prefix("~/") {
            Some(rest) => {
                expanded.push_str(&self.home_dir().to_string_lossy());
                expanded.push('/');
                rest
            }
            None => raw,
        };
        while let Some(start) = rest.find("${") {
            expanded.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| ExpandError::Unterminated(raw.to_owned()))?;
            expanded.push_str(&self.placeholder(&after[..end])?);
            rest = &after[end + 1..];
        }
        expanded.push_str(rest);
        Ok(PathBuf::from(expanded))
    }
}

#[cfg(test)]
pub(crate) fn test_context(root: &Path) -> RunContext {
    RunContext {
        server_name: "test-server".to_owned(),
        user: "alice".to_owned(),
        backups_path: root.join("backups"),
        backups_password: SecretValue::new("hunter2"),
        volumes_path: root.join("volumes"),
        apps_path: root.join("apps"),
        media_path: None,
        sync_path: Some(root.join("sync")),
        spec_dirs: vec![root.join("specs")],
        ntfy_url: None,
        ntfy_token: None,
        healthchecks_url: None,
    }
}
