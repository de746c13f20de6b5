//! Object store access
//!
//! Checkpoints (and optionally archived log content) live in an object store
//! addressed by bucket and key. A missing key is reported as
//! [`StoreError::NotFound`] so callers can tell "never written" apart from
//! every other failure.

use crate::sync::retry::{RemoteError, RetryErrorType};
use async_trait::async_trait;
use std::time::Duration;

pub mod s3;

/// Object store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key does not exist
    #[error("object s3://{bucket}/{key} not found")]
    NotFound {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },

    /// Any other failure reported by the store
    #[error("{operation} s3://{bucket}/{key} failed ({error_type}): {message}")]
    Remote {
        /// Remote operation name
        operation: String,
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
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
}

impl StoreError {
    /// Whether this error means the key is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl RemoteError for StoreError {
    fn error_type(&self) -> RetryErrorType {
        match self {
            StoreError::NotFound { .. } => RetryErrorType::NotFound,
            StoreError::Remote { error_type, .. } => *error_type,
            StoreError::Timeout { .. } => RetryErrorType::NetworkTimeout,
        }
    }

    fn timed_out(operation: &str, after: Duration) -> Self {
        StoreError::Timeout {
            operation: operation.to_string(),
            after,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Bucket/key addressed object store with overwrite semantics
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object's bytes, or [`StoreError::NotFound`] when the key is absent
    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Write an object, replacing any previous content
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> StoreResult<()>;
}
