//! Sinks for downloaded log content
//!
//! By default a pass only advances the checkpoint. When archiving is enabled,
//! each fully downloaded file is handed to a [`LogSink`] before the
//! checkpoint moves past it.

use crate::store::{ObjectStore, StoreError};
use crate::sync::retry::{with_retry, RetryPolicy};
use crate::LogFileDescriptor;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub mod path;

pub use path::{archive_file_path, archive_key};

/// Output sink errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Store error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Name that cannot be mapped to an archive location
    #[error("invalid name: {0}")]
    InvalidName(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for the content of downloaded log files
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Persist one file's content, returning where it was written
    async fn write_log(
        &self,
        instance: &str,
        file: &LogFileDescriptor,
        content: &str,
    ) -> OutputResult<String>;
}

/// Archives content into an object store bucket under a key prefix
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
    retry: RetryPolicy,
}

impl ObjectStoreSink {
    /// Create a sink writing below `prefix` in `bucket`
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
            retry,
        }
    }
}

#[async_trait]
impl LogSink for ObjectStoreSink {
    async fn write_log(
        &self,
        instance: &str,
        file: &LogFileDescriptor,
        content: &str,
    ) -> OutputResult<String> {
        let key = archive_key(&self.prefix, instance, &file.name, file.last_written)?;
        let bucket = self.bucket.as_str();
        let store = self.store.as_ref();

        with_retry(&self.retry, "PutObject", &key, || {
            store.put(bucket, &key, content.as_bytes().to_vec())
        })
        .await?;

        debug!(bucket, key = %key, bytes = content.len(), "Archived log file");
        Ok(format!("s3://{bucket}/{key}"))
    }
}

/// Archives content into a local directory tree
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LogSink for DirectorySink {
    async fn write_log(
        &self,
        instance: &str,
        file: &LogFileDescriptor,
        content: &str,
    ) -> OutputResult<String> {
        let path = archive_file_path(&self.root, instance, &file.name, file.last_written)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OutputError::IoError(format!("{}: {e}", parent.display())))?;
        }

        // Write next to the target and rename so a crash never leaves a partial file
        let partial = path.with_extension("log.partial");
        tokio::fs::write(&partial, content.as_bytes())
            .await
            .map_err(|e| OutputError::IoError(format!("{}: {e}", partial.display())))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| OutputError::IoError(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = content.len(), "Archived log file");
        Ok(path.display().to_string())
    }
}
