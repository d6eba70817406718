use clap::Parser;
use std::process::ExitCode;
use stratus_core::settings::Settings;

mod cli;
mod commands;
mod logger;

async fn load_settings(args: &cli::Cli) -> eyre::Result<Settings> {
    Ok(match &args.settings {
        Some(path) => Settings::parse_file(path).await?,
        None => match cli::default_settings_path() {
            Some(path) => Settings::parse_file_or_default(&path).await?,
            None => Settings::default(),
        },
    })
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    let args = cli::Cli::parse();
    logger::setup_logger(args.log_file.as_deref(), args.verbose)?;
    let settings = load_settings(&args).await?;

    match args.command {
        cli::Cmd::Run => commands::run::run(args.context.into_context()?, &settings).await,
        cli::Cmd::Check => commands::check::check(args.context.into_context()?).await,
        cli::Cmd::Restic(restic_args) => {
            commands::restic(args.context.into_context()?, &settings, restic_args).await
        }
        cli::Cmd::Version => commands::version(&settings).await,
    }
}
