//! CLI command for listing database instances

use crate::directory::rds::RdsLogDirectory;
use crate::directory::LogDirectory;
use crate::sync::retry::with_retry;
use clap::Args;
use serde_json::json;
use tracing::info;

use super::{Cli, CliError, OutputFormat};

/// Instances subcommand
#[derive(Debug, Args)]
pub struct InstancesCommand {}

impl InstancesCommand {
    /// List instance identifiers in the configured region
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let sdk_config = cli.sdk_config().await;
        let directory = RdsLogDirectory::new(&sdk_config);
        let retry = cli.retry_policy();

        let instances = with_retry(&retry, "DescribeDBInstances", &cli.region, || {
            directory.list_instances()
        })
        .await?;
        info!(region = %cli.region, count = instances.len(), "Listed DB instances");

        match cli.output_format {
            OutputFormat::Json => {
                let output = json!({
                    "region": cli.region,
                    "instances": instances,
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            OutputFormat::Human => {
                if instances.is_empty() {
                    println!("No DB instances found in {}", cli.region);
                } else {
                    println!("DB instances in {}:", cli.region);
                    for (index, instance) in instances.iter().enumerate() {
                        if index == 0 {
                            println!("  {instance} (synced by default)");
                        } else {
                            println!("  {instance}");
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
