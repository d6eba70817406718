use super::Operations;
use crate::{
    exec::Invocation,
    model::{RepoSize, ServiceState},
};
use std::path::Path;

fn parse_du(stdout: &str) -> Option<u64> {
    stdout.split_whitespace().next()?.parse().ok()
}

impl Operations {
    async fn measure(&self, repo: &Path) -> RepoSize {
        match tokio::fs::metadata(repo).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => return RepoSize::Error("Not a directory".to_owned()),
            Err(_) => return RepoSize::Error("Repository not found".to_owned()),
        }

        let du = Invocation::new("du")
            .arg("-sb")
            .arg(repo.to_string_lossy().into_owned());
        match self.run_checked(&du).await {
            Ok(output) => match parse_du(&output.stdout) {
                Some(bytes) => RepoSize::Measured { bytes },
                None => RepoSize::Error(format!(
                    "Unexpected du output: {}",
                    output.stdout.trim()
                )),
            },
            Err(message) => RepoSize::Error(message),
        }
    }

    /// Measures every service's repository on disk, whatever its backup
    /// status. Only `size` is touched; a size error never fails a service.
    pub async fn calculate_repository_sizes(&self, states: &mut [ServiceState], output_base: &Path) {
        for state in states.iter_mut() {
            let repo = output_base.join(state.repository_name());
            let size = self.measure(&repo).await;
            match &size {
                RepoSize::Measured { bytes } => {
                    tracing::debug!(service = %state.display_name(), bytes, "measured repository")
                }
                RepoSize::Error(e) => {
                    tracing::warn!("could not measure repository of {}: {}", state.display_name(), e)
                }
            }
            state.size = Some(size);
        }
    }
}
