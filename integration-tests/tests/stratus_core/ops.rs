use crate::workdir;
use maplit::btreemap;
use std::{path::Path, sync::Arc};
use stratus_core::{
    config::{validate_and_normalize, Containers, Keyword, OrDefault, ServiceSpec},
    context::RunContext,
    exec::SystemRunner,
    model::{ContainerAction, ServiceState, Status, Step},
    ops::Operations,
    secrets::SecretValue,
    settings::Settings,
};

fn context(root: &Path) -> RunContext {
    RunContext {
        server_name: "nas".to_owned(),
        user: "alice".to_owned(),
        backups_path: root.join("backups"),
        backups_password: SecretValue::new("hunter2"),
        volumes_path: root.join("volumes"),
        apps_path: root.join("apps"),
        media_path: None,
        sync_path: None,
        spec_dirs: vec![root.join("specs")],
        ntfy_url: None,
        ntfy_token: None,
        healthchecks_url: None,
    }
}

fn service(context: &RunContext, name: &str, containers: &[&str]) -> ServiceState {
    std::fs::create_dir_all(context.volumes_path.join(name)).unwrap();
    let mut state = ServiceState::loaded(
        format!("/specs/{}.backup.toml", name),
        ServiceSpec {
            name: Some(name.to_owned()),
            source_paths: Some(OrDefault::Default(Keyword::Default)),
            containers: Some(Containers {
                stop: OrDefault::Explicit(containers.iter().map(|c| c.to_string()).collect()),
            }),
            ..Default::default()
        },
    );
    assert!(validate_and_normalize(&mut state, context));
    state
}

#[tokio::test]
async fn should_report_docker_error_output() {
    let root = tempfile::tempdir().unwrap();
    let context = context(root.path());
    let docker = workdir()
        .with_exit_status(1)
        .unwrap()
        .with_stderr("Error response from daemon: No such container: web\n")
        .unwrap();
    let settings = Settings {
        docker_binary: docker.bin_str(),
        ..Default::default()
    };
    let ops = Operations::new(Arc::new(SystemRunner), &context, &settings);
    let mut state = service(&context, "web", &["web"]);

    ops.manage_containers(&mut state, ContainerAction::Stop).await;

    assert_eq!(state.status(), Status::Error);
    let failure = state.failure().unwrap();
    assert_eq!(failure.step, Step::Docker(ContainerAction::Stop));
    assert_eq!(
        failure.message,
        "Error stopping container web:\nError response from daemon: No such container: web"
    );
    docker.args().unwrap().assert_args(&["stop", "web"]);
}

#[tokio::test]
async fn should_measure_repository_with_du() {
    let root = tempfile::tempdir().unwrap();
    let context = context(root.path());
    let repos = btreemap! {
        "photos" => true,
        "gone" => false,
    };
    let mut states = Vec::new();
    for (name, exists) in repos {
        if exists {
            let repo = context.backups_path.join(name);
            std::fs::create_dir_all(&repo).unwrap();
            std::fs::write(repo.join("config"), vec![0u8; 4096]).unwrap();
        }
        states.push(service(&context, name, &[]));
    }
    let ops = Operations::new(Arc::new(SystemRunner), &context, &Settings::default());

    ops.calculate_repository_sizes(&mut states, &context.backups_path)
        .await;

    let sizes = states
        .iter()
        .map(|s| (s.display_name(), s.size.clone()))
        .collect::<Vec<_>>();
    assert_eq!(sizes[0].0, "gone");
    assert_eq!(
        sizes[0].1,
        Some(stratus_core::model::RepoSize::Error(
            "Repository not found".to_owned()
        ))
    );
    match &sizes[1].1 {
        Some(stratus_core::model::RepoSize::Measured { bytes }) => assert!(*bytes >= 4096),
        other => panic!("unexpected size {:?}", other),
    }
}
