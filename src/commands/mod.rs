use crate::cli;
use std::process::ExitCode;
use stratus_core::{
    context::RunContext,
    exec::{CommandRunner, ExitStatus, SystemRunner},
    restic::Restic,
    secrets::SecretValue,
    settings::Settings,
};

pub mod check;
pub mod run;

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

/// Runs restic against one service's repository, with the repository
/// password already in place.
pub async fn restic(
    context: RunContext,
    settings: &Settings,
    args: cli::restic::Cli,
) -> eyre::Result<ExitCode> {
    context.validate()?;
    let services = stratus_run::load(&context).await?;
    let service = services
        .iter()
        .find(|s| s.display_name() == args.service || s.repository_name() == args.service)
        .ok_or_else(|| eyre::eyre!("no service named '{}'", args.service))?;

    let repo = context.repository_path(&service.repository_name());
    let restic = Restic::new(&settings.restic_binary, context.backups_password.clone());
    let status = SystemRunner
        .run_inherited(&restic.with_repo(&repo).args(args.cmd))
        .await?;
    Ok(exit_code(status))
}

pub async fn version(settings: &Settings) -> eyre::Result<ExitCode> {
    println!("stratus: {}", stratus_core::VERSION);

    let restic = Restic::new(&settings.restic_binary, SecretValue::new(""));
    let version = match SystemRunner.run(&restic.bare().arg("version")).await {
        Ok(output) if output.status.success() => Ok(output.stdout.trim().to_owned()),
        Ok(output) => Err(output.status.message()),
        Err(err) => Err(err.to_string()),
    };
    match version {
        Ok(version) => println!("restic: {}", version),
        Err(err) => println!(
            "Could not determine restic version ({}), is restic installed correctly?",
            err
        ),
    }
    Ok(ExitCode::SUCCESS)
}
