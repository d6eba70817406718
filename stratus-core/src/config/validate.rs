use super::{OrDefault, ResolvedSpec};
use crate::{
    context::RunContext,
    model::{ServiceState, Status, Step},
};
use std::path::PathBuf;

fn default_paths(context: &RunContext, name: &str) -> Vec<PathBuf> {
    vec![context.volumes_path.join(name)]
}

fn resolve_paths(
    context: &RunContext,
    name: &str,
    paths: &OrDefault<Vec<String>>,
) -> Result<Vec<PathBuf>, String> {
    match paths {
        OrDefault::Default(_) => Ok(default_paths(context, name)),
        OrDefault::Explicit(paths) => paths
            .iter()
            .map(|raw| {
                context
                    .expand(raw)
                    .map_err(|e| format!("Invalid path '{}': {}", raw, e))
            })
            .collect(),
    }
}

/// Resolves the `"default"` sentinels and placeholders of a loaded spec and
/// checks that every source path exists.
///
/// Returns false and marks the service failed at the `config` step if the
/// spec is unusable. A service that is already resolved is left alone, and a
/// service that already failed is not validated again.
pub fn validate_and_normalize(state: &mut ServiceState, context: &RunContext) -> bool {
    if state.resolved().is_some() {
        return true;
    }
    if state.status() != Status::InProgress {
        return false;
    }
    match resolve(state, context) {
        Ok(resolved) => {
            state.resolve(resolved);
            true
        }
        Err(message) => {
            state.fail(Step::Config, message);
            false
        }
    }
}

fn resolve(state: &ServiceState, context: &RunContext) -> Result<ResolvedSpec, String> {
    let spec = state.spec();
    let name = spec
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "Backup config is missing a name".to_owned())?;

    let source_paths = match &spec.source_paths {
        Some(paths) => resolve_paths(context, &name, paths)?,
        None => Vec::new(),
    };
    if source_paths.is_empty() {
        return Err("Backup config is missing source paths".to_owned());
    }
    // the first missing path aborts validation
    if let Some(missing) = source_paths
        .iter()
        .find(|path| !path.try_exists().unwrap_or(false))
    {
        return Err(format!("Source path {} does not exist", missing.display()));
    }

    let ownership_paths = match &spec.change_ownership {
        Some(paths) => resolve_paths(context, &name, paths)?,
        None => Vec::new(),
    };

    let containers = match spec.containers.as_ref().map(|c| &c.stop) {
        Some(OrDefault::Default(_)) => vec![name.clone()],
        Some(OrDefault::Explicit(containers)) => containers.clone(),
        None => Vec::new(),
    };

    let dest_name = spec
        .dest_name
        .clone()
        .filter(|dest| !dest.is_empty())
        .unwrap_or_else(|| name.clone());

    Ok(ResolvedSpec {
        name,
        dest_name,
        source_paths,
        ownership_paths,
        containers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Containers, Keyword, ServiceSpec},
        context::test_context,
    };
    use std::path::Path;

    fn state(spec: ServiceSpec) -> ServiceState {
        ServiceState::loaded("/specs/test.backup.toml", spec)
    }

    fn default_spec(name: &str) -> ServiceSpec {
        ServiceSpec {
            name: Some(name.to_owned()),
            source_paths: Some(OrDefault::Default(Keyword::Default)),
            change_ownership: Some(OrDefault::Default(Keyword::Default)),
            containers: Some(Containers {
                stop: OrDefault::Default(Keyword::Default),
            }),
            ..Default::default()
        }
    }

    fn setup() -> (tempfile::TempDir, RunContext) {
        let root = tempfile::tempdir().unwrap();
        let context = test_context(root.path());
        (root, context)
    }

    #[test]
    fn should_resolve_default_sentinels() {
        let (_root, context) = setup();
        std::fs::create_dir_all(context.volumes_path.join("vaultwarden")).unwrap();
        let mut state = state(default_spec("vaultwarden"));

        assert!(validate_and_normalize(&mut state, &context));

        assert_eq!(
            state.resolved(),
            Some(&ResolvedSpec {
                name: "vaultwarden".to_owned(),
                dest_name: "vaultwarden".to_owned(),
                source_paths: vec![context.volumes_path.join("vaultwarden")],
                ownership_paths: vec![context.volumes_path.join("vaultwarden")],
                containers: vec!["vaultwarden".to_owned()],
            })
        );
        assert_eq!(state.status(), Status::InProgress);
    }

    #[test]
    fn should_be_idempotent() {
        let (_root, context) = setup();
        std::fs::create_dir_all(context.volumes_path.join("vaultwarden")).unwrap();
        let mut state = state(default_spec("vaultwarden"));
        assert!(validate_and_normalize(&mut state, &context));
        let first = state.resolved().cloned();

        assert!(validate_and_normalize(&mut state, &context));

        assert_eq!(state.resolved().cloned(), first);
        assert_eq!(state.resolved().unwrap().source_paths.len(), 1);
    }

    #[test]
    fn should_fail_without_name() {
        let (_root, context) = setup();
        let mut state = state(ServiceSpec {
            source_paths: Some(OrDefault::Explicit(vec!["/".to_owned()])),
            ..Default::default()
        });

        assert!(!validate_and_normalize(&mut state, &context));

        assert_eq!(state.status(), Status::Error);
        assert_eq!(state.failure().unwrap().step, Step::Config);
        assert_eq!(state.display_name(), "test.backup.toml");
    }

    #[test]
    fn should_fail_without_source_paths() {
        let (_root, context) = setup();
        let mut state = state(ServiceSpec {
            name: Some("empty".to_owned()),
            source_paths: Some(OrDefault::Explicit(vec![])),
            ..Default::default()
        });

        assert!(!validate_and_normalize(&mut state, &context));

        assert_eq!(
            state.failure().unwrap().message,
            "Backup config is missing source paths"
        );
    }

    #[test]
    fn should_report_first_missing_source_path() {
        let (root, context) = setup();
        let existing = root.path().join("existing");
        std::fs::create_dir_all(&existing).unwrap();
        let mut state = state(ServiceSpec {
            name: Some("media".to_owned()),
            source_paths: Some(OrDefault::Explicit(vec![
                existing.to_string_lossy().into_owned(),
                "/does/not/exist/1".to_owned(),
                "/does/not/exist/2".to_owned(),
            ])),
            ..Default::default()
        });

        assert!(!validate_and_normalize(&mut state, &context));

        assert_eq!(
            state.failure().unwrap().message,
            format!("Source path {} does not exist", Path::new("/does/not/exist/1").display())
        );
        assert_eq!(state.failures().len(), 1);
        assert!(state.resolved().is_none());
    }

    #[test]
    fn should_fail_for_unset_placeholder() {
        let (_root, context) = setup();
        let mut state = state(ServiceSpec {
            name: Some("immich".to_owned()),
            source_paths: Some(OrDefault::Explicit(vec!["${PATH_MEDIA}/photos".to_owned()])),
            ..Default::default()
        });

        assert!(!validate_and_normalize(&mut state, &context));

        assert_eq!(state.failure().unwrap().step, Step::Config);
    }

    #[test]
    fn should_expand_explicit_paths_and_keep_containers() {
        let (_root, context) = setup();
        std::fs::create_dir_all(context.volumes_path.join("immich")).unwrap();
        let mut state = state(ServiceSpec {
            name: Some("immich".to_owned()),
            dest_name: Some("immich-home".to_owned()),
            source_paths: Some(OrDefault::Explicit(vec!["${VOLUMES_PATH}/immich".to_owned()])),
            change_ownership: None,
            containers: Some(Containers {
                stop: OrDefault::Explicit(vec!["immich-server".to_owned(), "immich-db".to_owned()]),
            }),
        });

        assert!(validate_and_normalize(&mut state, &context));

        let resolved = state.resolved().unwrap();
        assert_eq!(resolved.dest_name, "immich-home");
        assert_eq!(resolved.source_paths, vec![context.volumes_path.join("immich")]);
        assert!(resolved.ownership_paths.is_empty());
        assert_eq!(resolved.containers, vec!["immich-server", "immich-db"]);
    }

    #[test]
    fn should_not_revalidate_failed_service() {
        let (_root, context) = setup();
        let mut state = ServiceState::invalid("/specs/broken.backup.toml", "parse error");

        assert!(!validate_and_normalize(&mut state, &context));

        assert_eq!(state.failures().len(), 1);
    }
}
