//! Incremental sync orchestration
//!
//! One pass over one instance:
//!
//! 1. **Read checkpoint**: [`crate::resume::read_checkpoint`], `0` when none exists
//! 2. **Enumerate**: list the instance's log files and classify each against
//!    the checkpoint ([`crate::resume::Checkpoint::classify`])
//! 3. **Download**: fetch every due file with the marker loop in
//!    [`crate::directory::download_log_file`], optionally archiving it
//! 4. **Write checkpoint**: store the candidate computed by the configured
//!    [`crate::resume::CheckpointPolicy`]; a failed write is logged, not fatal
//!
//! # Error Handling
//!
//! Failures listing instances, reading the checkpoint (other than a missing
//! key), listing log files or downloading a file end the pass with a
//! [`SyncError`] and leave the stored checkpoint untouched.

pub mod config;
pub mod engine;
pub mod report;
pub mod retry;

pub use config::{InstanceSelection, SyncOptions};
pub use engine::{InstanceOutcome, SyncEngine};
pub use report::{CheckpointWrite, DownloadedFile, SyncReport};

use crate::directory::DirectoryError;
use crate::output::OutputError;
use crate::store::StoreError;
use std::time::Duration;

/// Sync errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Invalid options
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Listing database instances failed
    #[error("failed to list DB instances: {0}")]
    ListInstances(#[source] DirectoryError),

    /// No instances are visible in the region
    #[error("no DB instances found")]
    NoInstances,

    /// The requested instance is not listed
    #[error("DB instance {0} not found")]
    InstanceNotFound(String),

    /// Reading the checkpoint failed for a reason other than a missing key
    #[error("failed to read checkpoint s3://{bucket}/{key}: {source}")]
    CheckpointRead {
        /// Bucket name
        bucket: String,
        /// Checkpoint key
        key: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// The stored checkpoint cannot be decoded
    #[error("corrupt checkpoint s3://{bucket}/{key}: {reason}")]
    CorruptCheckpoint {
        /// Bucket name
        bucket: String,
        /// Checkpoint key
        key: String,
        /// Why decoding failed
        reason: String,
    },

    /// Listing log files failed
    #[error("failed to list log files of {instance}: {source}")]
    ListLogFiles {
        /// Database instance identifier
        instance: String,
        /// Underlying directory error
        #[source]
        source: DirectoryError,
    },

    /// A log file could not be downloaded completely
    #[error("incomplete download of {file} from {instance}: {source}")]
    PaginationIncomplete {
        /// Database instance identifier
        instance: String,
        /// Log file name
        file: String,
        /// Underlying directory error
        #[source]
        source: DirectoryError,
    },

    /// Archiving a downloaded file failed
    #[error("failed to archive {file} from {instance}: {source}")]
    Archive {
        /// Database instance identifier
        instance: String,
        /// Log file name
        file: String,
        /// Underlying sink error
        #[source]
        source: OutputError,
    },

    /// The pass exceeded its deadline
    #[error("pass over {instance} exceeded deadline of {deadline:?}")]
    DeadlineExceeded {
        /// Database instance identifier
        instance: String,
        /// Configured deadline
        deadline: Duration,
    },

    /// Shutdown was requested during the pass
    #[error("sync of {instance} cancelled by shutdown request")]
    Cancelled {
        /// Database instance identifier
        instance: String,
    },
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
