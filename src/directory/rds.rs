//! RDS implementation of the log directory
//!
//! Maps the three directory operations onto `DescribeDBInstances`,
//! `DescribeDBLogFiles` and `DownloadDBLogFilePortion`. Listing calls follow
//! the service's list markers so large accounts and instances with many log
//! files are enumerated completely.

use super::{DirectoryError, DirectoryResult, LogDirectory};
use crate::aws::{classify_sdk_error, describe_sdk_error};
use crate::{LogFileDescriptor, LogPortion};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::error::ProvideErrorMetadata;
use aws_sdk_rds::Client;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use tracing::{debug, warn};

/// Log directory backed by the RDS API
#[derive(Debug, Clone)]
pub struct RdsLogDirectory {
    client: Client,
}

impl RdsLogDirectory {
    /// Create a directory from a loaded SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn remote_error<E>(operation: &str, err: SdkError<E, HttpResponse>) -> DirectoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    DirectoryError::Remote {
        operation: operation.to_string(),
        error_type: classify_sdk_error(&err),
        message: describe_sdk_error(&err),
    }
}

#[async_trait]
impl LogDirectory for RdsLogDirectory {
    async fn list_instances(&self) -> DirectoryResult<Vec<String>> {
        let mut instances = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_db_instances()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| remote_error("DescribeDBInstances", e))?;

            for instance in response.db_instances() {
                match instance.db_instance_identifier() {
                    Some(identifier) => {
                        debug!(instance = identifier, "Found DB instance");
                        instances.push(identifier.to_string());
                    }
                    None => warn!("DescribeDBInstances returned an instance without identifier"),
                }
            }

            match response.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(instances)
    }

    async fn list_log_files(&self, instance: &str) -> DirectoryResult<Vec<LogFileDescriptor>> {
        let mut files = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_db_log_files()
                .db_instance_identifier(instance)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| remote_error("DescribeDBLogFiles", e))?;

            for details in response.describe_db_log_files() {
                let (Some(name), Some(last_written)) =
                    (details.log_file_name(), details.last_written())
                else {
                    return Err(DirectoryError::InvalidResponse(format!(
                        "DescribeDBLogFiles for {instance} returned an entry without name or LastWritten"
                    )));
                };

                let mut file = LogFileDescriptor::new(name, last_written);
                if let Some(size) = details.size() {
                    file = file.with_size(size);
                }
                files.push(file);
            }

            match response.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(files)
    }

    async fn download_log_portion(
        &self,
        instance: &str,
        file_name: &str,
        marker: &str,
    ) -> DirectoryResult<LogPortion> {
        let response = self
            .client
            .download_db_log_file_portion()
            .db_instance_identifier(instance)
            .log_file_name(file_name)
            .marker(marker)
            .send()
            .await
            .map_err(|e| remote_error("DownloadDBLogFilePortion", e))?;

        Ok(LogPortion {
            marker: response.marker().unwrap_or_default().to_string(),
            data: response.log_file_data().unwrap_or_default().to_string(),
            more_pending: response.additional_data_pending().unwrap_or(false),
        })
    }
}
