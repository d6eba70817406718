//! Service spec files: one TOML declaration per backed-up service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod discover;
mod validate;

pub use discover::{discover, is_spec_file, DiscoverError};
pub use validate::validate_and_normalize;

/// The `"default"` keyword accepted in place of an explicit list.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Keyword {
    #[serde(rename = "default")]
    Default,
}

/// Either the `"default"` sentinel or an explicit value.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrDefault<T> {
    Default(Keyword),
    Explicit(T),
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Containers {
    pub stop: OrDefault<Vec<String>>,
}

/// A service backup declaration exactly as written by its author.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServiceSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Repository name override, for services whose repository is shared
    /// between hosts.
    #[serde(default, alias = "dest_name")]
    pub dest_name: Option<String>,
    #[serde(default, alias = "source_paths")]
    pub source_paths: Option<OrDefault<Vec<String>>>,
    #[serde(default, alias = "change_ownership")]
    pub change_ownership: Option<OrDefault<Vec<String>>>,
    #[serde(default)]
    pub containers: Option<Containers>,
}

/// A spec with every sentinel and placeholder resolved to concrete values.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedSpec {
    pub name: String,
    pub dest_name: String,
    pub source_paths: Vec<PathBuf>,
    pub ownership_paths: Vec<PathBuf>,
    pub containers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("invalid service spec file {}", .0.display())]
    InvalidSpecFile(PathBuf, #[source] toml::de::Error),
    #[error("i/o error reading service spec file {}", .0.display())]
    IoError(PathBuf, #[source] std::io::Error),
}

impl ServiceSpec {
    pub fn parse(s: &str) -> Result<ServiceSpec, toml::de::Error> {
        toml::from_str(s)
    }

    pub async fn parse_file(p: &Path) -> Result<ServiceSpec, ConfigLoadError> {
        let spec_string = tokio::fs::read_to_string(p)
            .await
            .map_err(|e| ConfigLoadError::IoError(p.to_owned(), e))?;
        Self::parse(&spec_string).map_err(|e| ConfigLoadError::InvalidSpecFile(p.to_owned(), e))
    }
}
