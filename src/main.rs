use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docgen::{Cli, EndpointClient, Orchestrator, ReqwestTransport, RunConfig, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = Settings::resolve(cli)?;

    let transport = ReqwestTransport::new(settings.timeout, settings.insecure)?;
    let run_config = RunConfig::from(&settings);
    let client = EndpointClient::new(transport, Some(settings.key), settings.url);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing the current file");
            on_interrupt.cancel();
        }
    });

    let report = Orchestrator::new(client, run_config)
        .with_cancellation(cancel)
        .run()
        .await?;

    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "Documentation generation finished"
    );
    for failure in &report.failures {
        error!(file = %failure.target, error = %failure.error, "Not generated");
    }
    Ok(report.is_complete())
}
