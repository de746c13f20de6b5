//! Database log directory access
//!
//! The [`LogDirectory`] trait is the seam between the sync engine and the
//! service that owns the log files. [`rds::RdsLogDirectory`] implements it over
//! the RDS API; tests substitute scripted implementations.

use crate::sync::retry::{RemoteError, RetryErrorType};
use crate::{LogFileDescriptor, LogPortion};
use async_trait::async_trait;
use std::time::Duration;

pub mod pagination;
pub mod rds;

pub use pagination::{download_log_file, DownloadedLog};

/// Log directory errors
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The service rejected or failed the call
    #[error("{operation} failed ({error_type}): {message}")]
    Remote {
        /// Remote operation name
        operation: String,
        /// Error classification
        error_type: RetryErrorType,
        /// Error details
        message: String,
    },

    /// The call did not finish within the per-call timeout
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Remote operation name
        operation: String,
        /// Configured timeout
        after: Duration,
    },

    /// The service answered with data that cannot be used
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A download kept reporting pending data past the page cap
    #[error("download of {file} still pending after {pages} pages - possible infinite loop")]
    PaginationLimit {
        /// Log file name
        file: String,
        /// Pages fetched before giving up
        pages: usize,
    },
}

impl RemoteError for DirectoryError {
    fn error_type(&self) -> RetryErrorType {
        match self {
            DirectoryError::Remote { error_type, .. } => *error_type,
            DirectoryError::Timeout { .. } => RetryErrorType::NetworkTimeout,
            DirectoryError::InvalidResponse(_) | DirectoryError::PaginationLimit { .. } => {
                RetryErrorType::InvalidResponse
            }
        }
    }

    fn timed_out(operation: &str, after: Duration) -> Self {
        DirectoryError::Timeout {
            operation: operation.to_string(),
            after,
        }
    }
}

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Remote directory of database instances and their log files
#[async_trait]
pub trait LogDirectory: Send + Sync {
    /// List the identifiers of all database instances visible to the caller
    async fn list_instances(&self) -> DirectoryResult<Vec<String>>;

    /// List the log files currently available for an instance, in service order
    async fn list_log_files(&self, instance: &str) -> DirectoryResult<Vec<LogFileDescriptor>>;

    /// Download one portion of a log file starting at `marker`
    ///
    /// # Arguments
    /// * `instance` - Database instance identifier
    /// * `file_name` - Log file name as listed
    /// * `marker` - `"0"` for the start of the file, otherwise the marker
    ///   returned by the previous portion
    async fn download_log_portion(
        &self,
        instance: &str,
        file_name: &str,
        marker: &str,
    ) -> DirectoryResult<LogPortion>;
}
