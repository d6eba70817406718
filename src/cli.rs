use dirs_next as dirs;
use std::path::PathBuf;
use stratus_core::{
    context::{ContextError, RunContext},
    secrets::SecretValue,
};

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stratus").join("settings.toml"))
}

/// Backs up docker services and their data into restic repositories.
#[derive(clap::Parser)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Sets a custom settings file path
    #[arg(short, long, env = "STRATUS_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Appends log output to this file
    #[arg(long, env = "STRATUS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enables debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub context: ContextArgs,

    #[command(subcommand)]
    pub command: Cmd,
}

/// Where things are on this host. Mostly set through the environment.
#[derive(clap::Args)]
pub struct ContextArgs {
    /// Name of this server in reports, defaults to the host name
    #[arg(long, env = "SERVER_NAME")]
    pub server_name: Option<String>,

    /// User that owns service data and repositories
    #[arg(long, env = "USER")]
    pub user: Option<String>,

    /// Directory that holds one restic repository per service
    #[arg(long, env = "PATH_BACKUPS")]
    pub backups_path: Option<PathBuf>,

    /// Password for every repository
    #[arg(long, env = "BACKUPS_PASSWORD", hide_env_values = true)]
    pub backups_password: Option<String>,

    /// Directory that holds service volumes
    #[arg(long, env = "VOLUMES_PATH")]
    pub volumes_path: Option<PathBuf>,

    /// Directory that holds the application stacks
    #[arg(long, env = "PATH_APPS")]
    pub apps_path: Option<PathBuf>,

    #[arg(long, env = "PATH_MEDIA")]
    pub media_path: Option<PathBuf>,

    #[arg(long, env = "PATH_SYNC")]
    pub sync_path: Option<PathBuf>,

    /// Directories to search for service specs, comma-separated
    #[arg(long, env = "STRATUS_SPEC_DIRS", value_delimiter = ',')]
    pub spec_dirs: Vec<PathBuf>,

    /// ntfy topic URL for the run report
    #[arg(long, env = "NTFY_URL_BACKUPS")]
    pub ntfy_url: Option<String>,

    #[arg(long, env = "NTFY_TOKEN_BACKUPS", hide_env_values = true)]
    pub ntfy_token: Option<String>,

    /// healthchecks ping URL
    #[arg(long, env = "HEALTHCHECKS_BACKUP_URL")]
    pub healthchecks_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ContextArgs {
    pub fn into_context(self) -> eyre::Result<RunContext> {
        let server_name = match non_empty(self.server_name) {
            Some(name) => name,
            None => hostname::get()?.to_string_lossy().into_owned(),
        };
        let user = non_empty(self.user).ok_or(ContextError::Missing("USER"))?;
        let backups_path = self
            .backups_path
            .ok_or(ContextError::Missing("PATH_BACKUPS"))?;
        let volumes_path = self
            .volumes_path
            .ok_or(ContextError::Missing("VOLUMES_PATH"))?;
        let apps_path = self.apps_path.ok_or(ContextError::Missing("PATH_APPS"))?;
        let spec_dirs = if self.spec_dirs.is_empty() {
            RunContext::default_spec_dirs(&apps_path)
        } else {
            self.spec_dirs
        };

        Ok(RunContext {
            server_name,
            user,
            backups_path,
            backups_password: SecretValue::new(self.backups_password.unwrap_or_default()),
            volumes_path,
            apps_path,
            media_path: self.media_path,
            sync_path: self.sync_path,
            spec_dirs,
            ntfy_url: non_empty(self.ntfy_url),
            ntfy_token: non_empty(self.ntfy_token).map(SecretValue::new),
            healthchecks_url: non_empty(self.healthchecks_url),
        })
    }
}

#[derive(clap::Subcommand)]
pub enum Cmd {
    /// Backs up every service and sends the report
    Run,

    /// Validates every service spec without changing anything
    Check,

    /// Runs a restic command against a service's repository
    Restic(restic::Cli),

    /// Prints version information
    Version,
}

pub mod restic {
    #[derive(clap::Args)]
    pub struct Cli {
        /// The service whose repository to use
        #[arg(value_name = "SERVICE")]
        pub service: String,

        /// Command-line arguments to pass to restic
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        pub cmd: Vec<String>,
    }
}
