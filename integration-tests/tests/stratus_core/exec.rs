use crate::workdir;
use stratus_core::exec::{CommandRunner, Error, ExitStatus, Invocation, SystemRunner};

#[tokio::test]
async fn should_capture_stdout_and_stderr() {
    let workdir = workdir()
        .with_stdout("1073741824\t/backups/web\n")
        .unwrap()
        .with_stderr("warning: something\n")
        .unwrap();

    let output = SystemRunner
        .run(&Invocation::new(workdir.bin_str()))
        .await
        .unwrap();

    assert_eq!(output.status, ExitStatus::Successful);
    assert_eq!(output.stdout, "1073741824\t/backups/web\n");
    assert_eq!(output.stderr, "warning: something\n");
}

#[tokio::test]
async fn should_capture_exit_code() {
    let workdir = workdir()
        .with_exit_status(10)
        .unwrap()
        .with_stderr("Fatal: repository does not exist")
        .unwrap();

    let output = SystemRunner
        .run(&Invocation::new(workdir.bin_str()))
        .await
        .unwrap();

    assert_eq!(output.status, ExitStatus::Failed(Some(10)));
    assert_eq!(output.status.code(), Some(10));
    assert_eq!(output.diagnostics(), "Fatal: repository does not exist");
}

#[tokio::test]
async fn should_pass_arguments_verbatim() {
    let workdir = workdir();

    SystemRunner
        .run(&Invocation::new(workdir.bin_str()).args(["stop", "immich server", "--time=30"]))
        .await
        .unwrap();

    workdir
        .args()
        .unwrap()
        .assert_args(&["stop", "immich server", "--time=30"]);
}

#[tokio::test]
async fn should_return_exit_status_of_inherited_run() {
    let workdir = workdir().with_exit_status(3).unwrap();

    let status = SystemRunner
        .run_inherited(&Invocation::new(workdir.bin_str()))
        .await
        .unwrap();

    assert_eq!(status, ExitStatus::Failed(Some(3)));
}

#[tokio::test]
async fn should_fail_to_start_missing_program() {
    let workdir = workdir();
    let missing = workdir.path().join("does-not-exist");

    let result = SystemRunner
        .run(&Invocation::new(missing.to_string_lossy()))
        .await;

    assert!(matches!(result, Err(Error::FailedToStart { .. })));
}
