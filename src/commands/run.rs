use std::{process::ExitCode, sync::Arc};
use stratus_core::{context::RunContext, exec::SystemRunner, ops::Operations, settings::Settings};
use stratus_run::{
    notifications::{Notifier, ReqwestTransport},
    report::console_report,
    BackupWorkflow, Orchestrator,
};

pub async fn run(context: RunContext, settings: &Settings) -> eyre::Result<ExitCode> {
    context.validate()?;
    tracing::info!(
        server = %context.server_name,
        version = stratus_core::VERSION,
        "starting backups"
    );

    let ops = Operations::new(Arc::new(SystemRunner), &context, settings);
    let workflow = BackupWorkflow::new(ops.clone(), &context.backups_path);
    let result = Orchestrator::new(&context, ops, workflow).run().await?;

    print!("{}", console_report(&result));

    // a broken notification channel never changes the outcome of the run
    match ReqwestTransport::new() {
        Ok(transport) => {
            Notifier::new(Arc::new(transport), &context, &settings.notifications)
                .send(&result)
                .await;
        }
        Err(e) => tracing::error!("could not set up HTTP client, skipping notifications: {}", e),
    }

    Ok(if result.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
