//! Checkpoint persistence in the object store
//!
//! Layout: the checkpoint for instance `db1` in bucket `b` is stored in bucket
//! `b` under key `b/db1/LOGPOINTER.TXT`, as decimal ASCII.

use super::checkpoint::Checkpoint;
use crate::store::{ObjectStore, StoreError};
use crate::sync::config::CHECKPOINT_FILE_NAME;
use crate::sync::retry::{with_retry, RetryPolicy};
use tracing::{debug, info};

/// Errors reading or writing a checkpoint
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// Store failure other than a missing key
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The stored value is not a valid checkpoint
    #[error("corrupt checkpoint at s3://{bucket}/{key}: {reason}")]
    Corrupt {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Why decoding failed
        reason: String,
    },
}

/// Deterministic checkpoint key for an instance
pub fn checkpoint_key(bucket: &str, instance: &str) -> String {
    format!("{bucket}/{instance}/{CHECKPOINT_FILE_NAME}")
}

/// Read the stored checkpoint
///
/// A missing key yields [`Checkpoint::NEVER_SYNCED`]. Every other store error
/// is returned, never mistaken for a first sync.
pub async fn read_checkpoint(
    store: &dyn ObjectStore,
    retry: &RetryPolicy,
    bucket: &str,
    key: &str,
) -> Result<Checkpoint, ResumeError> {
    debug!(bucket, key, "Reading checkpoint");

    let bytes = match with_retry(retry, "GetObject", key, || store.get(bucket, key)).await {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => {
            info!(
                bucket,
                key, "No checkpoint found - logs were never downloaded for this instance"
            );
            return Ok(Checkpoint::NEVER_SYNCED);
        }
        Err(e) => return Err(ResumeError::Store(e)),
    };

    let checkpoint = Checkpoint::decode(&bytes).map_err(|reason| ResumeError::Corrupt {
        bucket: bucket.to_string(),
        key: key.to_string(),
        reason,
    })?;

    debug!(bucket, key, checkpoint = %checkpoint, "Checkpoint loaded");
    Ok(checkpoint)
}

/// Overwrite the stored checkpoint
pub async fn write_checkpoint(
    store: &dyn ObjectStore,
    retry: &RetryPolicy,
    bucket: &str,
    key: &str,
    checkpoint: Checkpoint,
) -> Result<(), ResumeError> {
    debug!(bucket, key, checkpoint = %checkpoint, "Writing checkpoint");

    with_retry(retry, "PutObject", key, || {
        store.put(bucket, key, checkpoint.encode())
    })
    .await?;

    info!(bucket, key, checkpoint = %checkpoint, "Checkpoint saved");
    Ok(())
}
