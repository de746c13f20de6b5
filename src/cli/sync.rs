//! Sync command implementation

use crate::aws::load_sdk_config;
use crate::directory::rds::RdsLogDirectory;
use crate::format_timestamp_ms;
use crate::resume::CheckpointPolicy;
use crate::shutdown::SharedShutdown;
use crate::store::s3::S3ObjectStore;
use crate::sync::config::{DEFAULT_MAX_PAGES, DEFAULT_REGION};
use crate::sync::retry::RetryPolicy;
use crate::sync::{CheckpointWrite, InstanceOutcome, InstanceSelection, SyncEngine, SyncOptions};
use aws_config::SdkConfig;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::{CheckpointCommand, CliError, InstancesCommand};

/// Parse and validate the page cap for one log file
fn parse_max_pages(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("max pages must be at least 1".to_string());
    }
    Ok(value)
}

/// Convert a seconds flag to an optional duration, `0` meaning disabled
fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Resolve the destination bucket from a flag or `RDSLOGSBUCKET`
pub(crate) fn require_bucket(bucket: Option<&str>) -> Result<String, CliError> {
    match bucket.map(str::trim) {
        Some(bucket) if !bucket.is_empty() => Ok(bucket.to_string()),
        _ => Err(CliError::InvalidArgument(
            "destination bucket is required: pass --bucket or set RDSLOGSBUCKET".to_string(),
        )),
    }
}

/// RDS log shipper CLI
#[derive(Parser, Debug)]
#[command(name = "rds-log-shipper")]
#[command(about = "Incrementally sync RDS database log files with a checkpoint in S3", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// AWS region of the database instances and the bucket
    #[arg(long, global = true, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Maximum number of retries for failed AWS calls (default: 5, range: 0-20)
    #[arg(long, global = true, default_value = "5", value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Timeout for a single AWS call in seconds (0 disables)
    #[arg(long, global = true, default_value = "60")]
    pub call_timeout_secs: u64,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address (e.g., 0.0.0.0:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Per-call timeout from `--call-timeout-secs`
    pub fn call_timeout(&self) -> Option<Duration> {
        optional_secs(self.call_timeout_secs)
    }

    /// Retry policy for commands that call AWS directly
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            call_timeout: self.call_timeout(),
            ..RetryPolicy::default()
        }
    }

    /// Load the AWS configuration for the selected region
    pub async fn sdk_config(&self) -> SdkConfig {
        load_sdk_config(&self.region, self.call_timeout()).await
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download new log files and advance the checkpoint
    Sync(SyncArgs),

    /// List database instance identifiers in the region
    Instances(InstancesCommand),

    /// Show the stored checkpoint of an instance
    Checkpoint(CheckpointCommand),
}

/// Sync command arguments
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Destination bucket holding checkpoints
    #[arg(long, env = "RDSLOGSBUCKET")]
    pub bucket: Option<String>,

    /// Sync only this instance (default: the first listed instance)
    #[arg(long, conflicts_with = "all_instances")]
    pub instance: Option<String>,

    /// Sync every listed instance, one pass each
    #[arg(long, default_value_t = false)]
    pub all_instances: bool,

    /// How the next checkpoint is derived: last-processed or maximum
    #[arg(long, default_value = "last-processed")]
    pub checkpoint_policy: CheckpointPolicy,

    /// Deadline for one pass over an instance in seconds (0 disables)
    #[arg(long, default_value = "1800")]
    pub pass_timeout_secs: u64,

    /// Maximum portions fetched for a single log file
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, value_parser = parse_max_pages)]
    pub max_pages: usize,

    /// Also upload downloaded content to the bucket under this key prefix
    #[arg(long, conflicts_with = "archive_dir")]
    pub archive_prefix: Option<String>,

    /// Also write downloaded content below this local directory
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,
}

impl SyncArgs {
    /// Instance selection from `--instance` / `--all-instances`
    pub fn selection(&self) -> InstanceSelection {
        match (&self.instance, self.all_instances) {
            (Some(name), _) => InstanceSelection::Named(name.clone()),
            (None, true) => InstanceSelection::All,
            (None, false) => InstanceSelection::First,
        }
    }

    /// Build and validate engine options
    pub fn options(&self, cli: &Cli) -> Result<SyncOptions, CliError> {
        let bucket = require_bucket(self.bucket.as_deref())?;

        let mut options = SyncOptions::new(bucket)
            .with_checkpoint_policy(self.checkpoint_policy)
            .with_max_retries(cli.max_retries)
            .with_call_timeout(cli.call_timeout())
            .with_pass_deadline(optional_secs(self.pass_timeout_secs))
            .with_max_pages(self.max_pages);

        if let Some(prefix) = &self.archive_prefix {
            options = options.with_archive_prefix(prefix.clone());
        }
        if let Some(dir) = &self.archive_dir {
            options = options.with_archive_dir(dir.clone());
        }

        options.validate().map_err(CliError::ConfigurationError)?;
        Ok(options)
    }

    /// Execute the sync command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let options = self.options(cli)?;
        let selection = self.selection();

        info!(
            region = %cli.region,
            bucket = %options.bucket,
            policy = %options.checkpoint_policy,
            ?selection,
            "Starting sync"
        );

        let sdk_config = cli.sdk_config().await;
        let engine = SyncEngine::new(
            Arc::new(RdsLogDirectory::new(&sdk_config)),
            Arc::new(S3ObjectStore::new(&sdk_config)),
            options,
        )
        .with_shutdown(shutdown);

        let outcomes = engine.run(&selection).await?;

        match cli.output_format {
            OutputFormat::Json => output_json(&outcomes)?,
            OutputFormat::Human => output_human(&outcomes),
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        if failed > 0 {
            return Err(CliError::PassesFailed {
                failed,
                total: outcomes.len(),
            });
        }
        Ok(())
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Render pass outcomes as one JSON document
pub fn render_json(outcomes: &[InstanceOutcome]) -> Result<serde_json::Value, CliError> {
    let passes = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => Ok(serde_json::json!({
                "instance": outcome.instance,
                "success": true,
                "report": serde_json::to_value(report)?,
            })),
            Err(e) => Ok(serde_json::json!({
                "instance": outcome.instance,
                "success": false,
                "error": e.to_string(),
            })),
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    Ok(serde_json::json!({
        "success": outcomes.iter().all(|o| o.result.is_ok()),
        "passes": passes,
    }))
}

fn output_json(outcomes: &[InstanceOutcome]) -> Result<(), CliError> {
    println!("{}", serde_json::to_string(&render_json(outcomes)?)?);
    Ok(())
}

fn output_human(outcomes: &[InstanceOutcome]) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                println!("\nSync of {} completed", report.instance);
                println!("Checkpoint key: {}", report.checkpoint_key);
                println!(
                    "Previous checkpoint: {} ({})",
                    report.previous_checkpoint,
                    format_timestamp_ms(report.previous_checkpoint.value())
                );
                println!(
                    "Downloaded: {} file(s), {} bytes",
                    report.downloaded.len(),
                    report.total_bytes()
                );
                for file in &report.downloaded {
                    match &file.archived_to {
                        Some(location) => println!(
                            "  {} (last written {}, {} page(s)) -> {location}",
                            file.name, file.last_written, file.pages
                        ),
                        None => println!(
                            "  {} (last written {}, {} page(s))",
                            file.name, file.last_written, file.pages
                        ),
                    }
                }
                println!("Skipped: {} file(s) already captured", report.skipped.len());
                match &report.checkpoint_write {
                    CheckpointWrite::Written => {
                        println!("Next checkpoint: {} (saved)", report.next_checkpoint)
                    }
                    CheckpointWrite::Failed { error } => println!(
                        "Next checkpoint: {} (NOT saved: {error})",
                        report.next_checkpoint
                    ),
                    CheckpointWrite::Pending => {
                        println!("Next checkpoint: {} (not written)", report.next_checkpoint)
                    }
                }
            }
            Err(e) => {
                eprintln!("\nSync of {} failed!", outcome.instance);
                eprintln!("Error: {e}");
                error!(instance = %outcome.instance, "Sync failed: {}", e);
            }
        }
    }
}
