//! Main entry point for the rds-log-shipper CLI

use clap::Parser;
use rds_log_shipper::cli::{Cli, Commands};
use rds_log_shipper::metrics;
use rds_log_shipper::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Send logs to stderr, as JSON lines when `LOG_FORMAT=json`
///
/// stdout carries only the pass report.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rds_log_shipper=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        metrics::init_metrics(addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to start metrics exporter on {addr}: {e}"))?;
    }

    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!(
                    "Interrupted; LOGPOINTER.TXT keeps its previous value for the pass in progress"
                );
                shutdown.request_shutdown();
            }
        }
    });

    match &cli.command {
        Commands::Sync(args) => args.execute(&cli, shutdown.clone()).await?,
        Commands::Instances(cmd) => cmd.execute(&cli).await?,
        Commands::Checkpoint(cmd) => cmd.execute(&cli).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
