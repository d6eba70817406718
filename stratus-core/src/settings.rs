use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Tool-level settings, read from an optional TOML file.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    #[serde(alias = "restic_binary")]
    pub restic_binary: String,
    #[serde(alias = "docker_binary")]
    pub docker_binary: String,
    #[serde(alias = "use_sudo")]
    pub use_sudo: bool,
    pub retention: Retention,
    pub notifications: Notifications,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            restic_binary: "restic".to_owned(),
            docker_binary: "docker".to_owned(),
            use_sudo: true,
            retention: Default::default(),
            notifications: Default::default(),
        }
    }
}

/// How many snapshots survive a prune, per recency tier.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Retention {
    #[serde(alias = "keep_daily")]
    pub keep_daily: u32,
    #[serde(alias = "keep_weekly")]
    pub keep_weekly: u32,
    #[serde(alias = "keep_monthly")]
    pub keep_monthly: u32,
}

impl Default for Retention {
    fn default() -> Self {
        Retention {
            keep_daily: 7,
            keep_weekly: 4,
            keep_monthly: 3,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Notifications {
    #[serde(alias = "max_attempts")]
    pub max_attempts: u32,
    #[serde(with = "humantime_serde", alias = "retry_delay")]
    pub retry_delay: Duration,
    /// Number of services listed in the push notification body.
    #[serde(alias = "top_services")]
    pub top_services: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Notifications {
            max_attempts: 5,
            retry_delay: Duration::from_secs(3),
            top_services: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsLoadError {
    #[error("invalid settings file {}", .0.display())]
    InvalidSettingsFile(PathBuf, #[source] toml::de::Error),
    #[error("i/o error reading settings file {}", .0.display())]
    IoError(PathBuf, #[source] std::io::Error),
}

impl Settings {
    pub fn parse(s: &str) -> Result<Settings, toml::de::Error> {
        toml::from_str(s)
    }

    pub async fn parse_file(p: &Path) -> Result<Settings, SettingsLoadError> {
        let settings_string = tokio::fs::read_to_string(p)
            .await
            .map_err(|e| SettingsLoadError::IoError(p.to_owned(), e))?;
        Self::parse(&settings_string)
            .map_err(|e| SettingsLoadError::InvalidSettingsFile(p.to_owned(), e))
    }

    /// Loads the settings file if it exists; a missing file means defaults.
    pub async fn parse_file_or_default(p: &Path) -> Result<Settings, SettingsLoadError> {
        match tokio::fs::metadata(p).await {
            Ok(_) => Self::parse_file(p).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(SettingsLoadError::IoError(p.to_owned(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_get_default_settings() {
        let settings = Settings::parse("").unwrap();

        assert_eq!(
            settings,
            Settings {
                restic_binary: "restic".to_owned(),
                docker_binary: "docker".to_owned(),
                use_sudo: true,
                retention: Retention {
                    keep_daily: 7,
                    keep_weekly: 4,
                    keep_monthly: 3,
                },
                notifications: Notifications {
                    max_attempts: 5,
                    retry_delay: Duration::from_secs(3),
                    top_services: 10,
                },
            }
        );
    }

    #[test]
    fn should_parse_partial_settings() {
        let settings = Settings::parse(
            //language=TOML
            r#"
            restic-binary = "/opt/restic"
            use_sudo = false

            [retention]
            keep-daily = 14

            [notifications]
            retry-delay = "10s"
            "#,
        )
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                restic_binary: "/opt/restic".to_owned(),
                docker_binary: "docker".to_owned(),
                use_sudo: false,
                retention: Retention {
                    keep_daily: 14,
                    keep_weekly: 4,
                    keep_monthly: 3,
                },
                notifications: Notifications {
                    max_attempts: 5,
                    retry_delay: Duration::from_secs(10),
                    top_services: 10,
                },
            }
        );
    }

    #[tokio::test]
    async fn should_use_defaults_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let settings = Settings::parse_file_or_default(&dir.path().join("settings.toml"))
            .await
            .unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn should_fail_for_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = Settings::parse_file(&dir.path().join("settings.toml")).await;

        assert!(matches!(result, Err(SettingsLoadError::IoError(..))));
    }

    #[tokio::test]
    async fn should_report_invalid_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "use-sudo = \"maybe\"").unwrap();

        let result = Settings::parse_file_or_default(&path).await;

        assert!(matches!(
            result,
            Err(SettingsLoadError::InvalidSettingsFile(..))
        ));
    }
}
