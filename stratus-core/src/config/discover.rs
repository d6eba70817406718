use super::ServiceSpec;
use crate::{exec::error_chain, model::ServiceState};
use std::path::{Path, PathBuf};

const SPEC_SUFFIX: &str = ".backup.toml";
const STACK_SPEC_NAME: &str = "backup.toml";

#[derive(Debug, thiserror::Error)]
#[error("failed to read spec directory {}", .0.display())]
pub struct DiscoverError(PathBuf, #[source] std::io::Error);

/// True for `<anything>.backup.toml` files.
pub fn is_spec_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| {
            name.len() > SPEC_SUFFIX.len() && name.ends_with(SPEC_SUFFIX)
        })
}

async fn sorted_entries(dir: &Path) -> Result<Vec<(PathBuf, std::fs::FileType)>, DiscoverError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DiscoverError(dir.to_owned(), e))?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| DiscoverError(dir.to_owned(), e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| DiscoverError(entry.path(), e))?;
        entries.push((entry.path(), file_type));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

async fn spec_files(dir: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    let mut files = Vec::new();
    for (path, file_type) in sorted_entries(dir).await? {
        if file_type.is_file() && is_spec_file(&path) {
            files.push(path);
        } else if file_type.is_dir() {
            let stack_spec = path.join(STACK_SPEC_NAME);
            if tokio::fs::metadata(&stack_spec)
                .await
                .map_or(false, |m| m.is_file())
            {
                files.push(stack_spec);
            }
        }
    }
    Ok(files)
}

async fn load(file: PathBuf) -> ServiceState {
    match ServiceSpec::parse_file(&file).await {
        Ok(spec) => ServiceState::loaded(file, spec),
        Err(e) => {
            let message = format!("Failed to load config: {}", error_chain(&e));
            ServiceState::invalid(file, message)
        }
    }
}

/// Finds every service spec in the given directories.
///
/// A spec that fails to load still produces a state, already failed at the
/// `config` step, so it shows up in the report. Missing directories are
/// skipped; any other read error is fatal for the run.
#[tracing::instrument(level = "debug", skip_all)]
pub async fn discover(dirs: &[PathBuf]) -> Result<Vec<ServiceState>, DiscoverError> {
    let mut states = Vec::new();
    for dir in dirs {
        match tokio::fs::metadata(dir).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => {
                tracing::warn!("spec path {} is not a directory, skipping", dir.display());
                continue;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("spec directory {} does not exist, skipping", dir.display());
                continue;
            }
            Err(e) => return Err(DiscoverError(dir.clone(), e)),
        }

        for file in spec_files(dir).await? {
            tracing::debug!("loading {}", file.display());
            states.push(load(file).await);
        }
    }

    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, Step};

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn should_recognize_spec_files() {
        assert!(is_spec_file(Path::new("/x/immich.backup.toml")));
        assert!(!is_spec_file(Path::new("/x/.backup.toml")));
        assert!(!is_spec_file(Path::new("/x/immich.backup.ts")));
        assert!(!is_spec_file(Path::new("/x/immich.toml")));
    }

    #[tokio::test]
    async fn should_discover_specs_in_order() {
        let root = tempfile::tempdir().unwrap();
        let stacks = root.path().join("stacks");
        let configs = root.path().join("configs");
        write(&stacks.join("immich").join("backup.toml"), r#"name = "immich""#);
        write(&stacks.join("no-backup").join("compose.yml"), "");
        write(&configs.join("b.backup.toml"), r#"name = "b""#);
        write(&configs.join("a.backup.toml"), r#"name = "a""#);
        write(&configs.join("notes.txt"), "not a spec");

        let states = discover(&[stacks, configs]).await.unwrap();

        let names = states.iter().map(|s| s.display_name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["immich", "a", "b"]);
        assert!(states.iter().all(|s| s.status() == Status::InProgress));
    }

    #[tokio::test]
    async fn should_report_unparseable_spec_as_config_failure() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("broken.backup.toml"), "name = ");

        let states = discover(&[root.path().to_owned()]).await.unwrap();

        assert_eq!(states.len(), 1);
        assert_eq!(states[0].status(), Status::Error);
        assert_eq!(states[0].failure().unwrap().step, Step::Config);
        assert_eq!(states[0].display_name(), "broken.backup.toml");
    }

    #[tokio::test]
    async fn should_skip_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("a.backup.toml"), r#"name = "a""#);

        let states = discover(&[root.path().join("missing"), root.path().to_owned()])
            .await
            .unwrap();

        assert_eq!(states.len(), 1);
    }

    #[tokio::test]
    async fn should_find_nothing_in_empty_directory() {
        let root = tempfile::tempdir().unwrap();

        let states = discover(&[root.path().to_owned()]).await.unwrap();

        assert!(states.is_empty());
    }
}
