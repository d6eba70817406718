use crate::workdir;
use std::path::{Path, PathBuf};
use stratus_core::{
    exec::{CommandRunner, SystemRunner},
    restic::Restic,
    secrets::SecretValue,
    settings::Retention,
};

#[tokio::test]
async fn should_pass_password_through_environment_only() {
    let workdir = workdir();
    let restic = Restic::new(workdir.bin_str(), SecretValue::new("correct horse"));

    SystemRunner
        .run(&restic.check(Path::new("/srv/backups/web")))
        .await
        .unwrap();

    workdir
        .args()
        .unwrap()
        .assert_args(&["--repo", "/srv/backups/web", "check"])
        .assert_not_contains("correct horse");
    workdir
        .env()
        .unwrap()
        .assert_var("RESTIC_PASSWORD", "correct horse");
}

#[tokio::test]
async fn should_run_backup_with_service_tag() {
    let workdir = workdir();
    let restic = Restic::new(workdir.bin_str(), SecretValue::new("pw"));

    SystemRunner
        .run(&restic.backup(
            Path::new("/srv/backups/immich"),
            "immich",
            &[
                PathBuf::from("/srv/volumes/immich"),
                PathBuf::from("/srv/media/photos"),
            ],
        ))
        .await
        .unwrap();

    workdir.args().unwrap().assert_args(&[
        "--repo",
        "/srv/backups/immich",
        "backup",
        "/srv/volumes/immich",
        "/srv/media/photos",
        "--tag",
        "stratus.immich",
    ]);
}

#[tokio::test]
async fn should_run_forget_with_retention() {
    let workdir = workdir();
    let restic = Restic::new(workdir.bin_str(), SecretValue::new("pw"));
    let retention = Retention {
        keep_daily: 14,
        keep_weekly: 8,
        keep_monthly: 6,
    };

    SystemRunner
        .run(&restic.forget(Path::new("/srv/backups/web"), &retention))
        .await
        .unwrap();

    workdir.args().unwrap().assert_args(&[
        "--repo",
        "/srv/backups/web",
        "forget",
        "--prune",
        "--keep-daily",
        "14",
        "--keep-weekly",
        "8",
        "--keep-monthly",
        "6",
        "--group-by",
        "paths,tags",
    ]);
}
