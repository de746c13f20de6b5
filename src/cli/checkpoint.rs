//! CLI command for inspecting a stored checkpoint

use crate::format_timestamp_ms;
use crate::resume::{checkpoint_key, read_checkpoint};
use crate::store::s3::S3ObjectStore;
use clap::Args;
use serde_json::json;

use super::sync::require_bucket;
use super::{Cli, CliError, OutputFormat};

/// Checkpoint subcommand
#[derive(Debug, Args)]
pub struct CheckpointCommand {
    /// Destination bucket holding checkpoints
    #[arg(long, env = "RDSLOGSBUCKET")]
    pub bucket: Option<String>,

    /// Database instance identifier
    #[arg(long)]
    pub instance: String,
}

impl CheckpointCommand {
    /// Print the checkpoint stored for one instance
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let bucket = require_bucket(self.bucket.as_deref())?;
        let key = checkpoint_key(&bucket, &self.instance);

        let sdk_config = cli.sdk_config().await;
        let store = S3ObjectStore::new(&sdk_config);
        let checkpoint = read_checkpoint(&store, &cli.retry_policy(), &bucket, &key).await?;

        match cli.output_format {
            OutputFormat::Json => {
                let output = json!({
                    "instance": self.instance,
                    "bucket": bucket,
                    "key": key,
                    "checkpoint": checkpoint,
                    "never_synced": checkpoint.is_never_synced(),
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            OutputFormat::Human => {
                if checkpoint.is_never_synced() {
                    println!(
                        "No checkpoint for {} at s3://{bucket}/{key}; the next sync downloads every log file",
                        self.instance
                    );
                } else {
                    println!("Instance: {}", self.instance);
                    println!("Checkpoint key: s3://{bucket}/{key}");
                    println!(
                        "Captured through: {checkpoint} ({})",
                        format_timestamp_ms(checkpoint.value())
                    );
                }
            }
        }

        Ok(())
    }
}
