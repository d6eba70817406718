use std::process::ExitCode;
use stratus_core::{context::RunContext, model::ServiceState};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn write_color(text: &str, fg_color: Color) -> std::io::Result<()> {
    use std::io::Write as _;

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    stdout.set_color(ColorSpec::new().set_fg(Some(fg_color)))?;
    let result = stdout.write_all(text.as_bytes());
    stdout.reset().ok();
    result
}

fn print_service(state: &ServiceState) -> eyre::Result<()> {
    print!("{} ({}): ", state.display_name(), state.file().display());
    match (state.resolved(), state.failure()) {
        (Some(resolved), None) => {
            write_color("OK", Color::Green)?;
            println!();
            for line in toml::to_string_pretty(resolved)?.lines() {
                println!("    {}", line);
            }
        }
        (_, failure) => {
            write_color("FAILED", Color::Red)?;
            println!();
            if let Some(failure) = failure {
                println!(
                    "    [{}] {}",
                    failure.step.to_string().to_uppercase(),
                    failure.message
                );
            }
        }
    }
    Ok(())
}

/// Validates every service spec and prints what a run would do with it.
pub async fn check(context: RunContext) -> eyre::Result<ExitCode> {
    context.validate()?;
    let services = stratus_run::load(&context).await?;
    if services.is_empty() {
        println!("No service specs found");
        return Ok(ExitCode::FAILURE);
    }

    for state in &services {
        print_service(state)?;
    }

    Ok(if services.iter().any(ServiceState::is_failed) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
