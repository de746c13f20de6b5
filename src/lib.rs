//! # RDS Log Shipper Library
//!
//! Incrementally copies database engine log files from Amazon RDS into S3,
//! skipping files that were already captured by a previous run.
//!
//! ## Features
//!
//! - **Incremental sync**: a per-instance checkpoint (`LOGPOINTER.TXT`) records
//!   the last captured `LastWritten` timestamp
//! - **Marker pagination**: log files are downloaded portion by portion until
//!   the directory reports no more pending data
//! - **Bounded retry**: transient failures on every remote call are retried with
//!   exponential backoff, with per-call timeouts and a per-pass deadline
//! - **Optional archiving**: downloaded content can be persisted to S3 or a
//!   local directory
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rds_log_shipper::directory::rds::RdsLogDirectory;
//! use rds_log_shipper::store::s3::S3ObjectStore;
//! use rds_log_shipper::sync::{InstanceSelection, SyncEngine, SyncOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sdk_config = rds_log_shipper::aws::load_sdk_config("us-west-2", None).await;
//! let engine = SyncEngine::new(
//!     Arc::new(RdsLogDirectory::new(&sdk_config)),
//!     Arc::new(S3ObjectStore::new(&sdk_config)),
//!     SyncOptions::new("my-log-bucket"),
//! );
//!
//! let outcomes = engine.run(&InstanceSelection::First).await?;
//! for outcome in outcomes {
//!     println!("{}: {:?}", outcome.instance, outcome.result.is_ok());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`directory`] - Database log directory abstraction, RDS client, paginated downloader
//! - [`store`] - Object store abstraction and the S3 client
//! - [`resume`] - Checkpoint value, policy, key layout and persistence
//! - [`sync`] - Sync engine, retry, configuration and pass reports
//! - [`output`] - Optional sinks for downloaded log content
//! - [`cli`] - Command line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AWS SDK configuration and error classification
pub mod aws;

/// CLI command implementations
pub mod cli;

/// Database log directory access
pub mod directory;

/// Metrics collection
pub mod metrics;

/// Sinks for downloaded log content
pub mod output;

/// Checkpoint persistence
pub mod resume;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Object store access
pub mod store;

/// Incremental sync orchestration
pub mod sync;

/// A log file as reported by the database log directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileDescriptor {
    /// Log file name (e.g., "error/postgresql.log.2024-01-01-00")
    pub name: String,
    /// Last write time in the directory's timestamp unit (Unix milliseconds for RDS)
    pub last_written: i64,
    /// Size in bytes, when the directory reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl LogFileDescriptor {
    /// Create a descriptor without size information
    pub fn new(name: impl Into<String>, last_written: i64) -> Self {
        Self {
            name: name.into(),
            last_written,
            size: None,
        }
    }

    /// Attach the reported size
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }
}

/// One chunk of a log file returned by a single download call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPortion {
    /// Marker to pass to the next call
    pub marker: String,
    /// Log data contained in this portion
    pub data: String,
    /// Whether the directory has more data after this portion
    pub more_pending: bool,
}

impl LogPortion {
    /// Create a new portion
    pub fn new(marker: impl Into<String>, data: impl Into<String>, more_pending: bool) -> Self {
        Self {
            marker: marker.into(),
            data: data.into(),
            more_pending,
        }
    }
}

/// Render a millisecond timestamp for humans, falling back to the raw value
pub fn format_timestamp_ms(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) if millis > 0 => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => millis.to_string(),
    }
}
