//! Unit tests for reading and writing checkpoints through the object store

use crate::support::{immediate_retry, MemoryStore, BUCKET};
use rds_log_shipper::resume::{checkpoint_key, read_checkpoint, write_checkpoint, Checkpoint, ResumeError};
use rds_log_shipper::sync::retry::{RetryErrorType, RetryPolicy};

#[tokio::test]
async fn test_missing_checkpoint_reads_as_never_synced() {
    let store = MemoryStore::new();
    let key = checkpoint_key(BUCKET, "db-1");

    let checkpoint = read_checkpoint(&store, &RetryPolicy::none(), BUCKET, &key)
        .await
        .unwrap();

    assert_eq!(checkpoint, Checkpoint::NEVER_SYNCED);
}

#[tokio::test]
async fn test_stored_checkpoint_is_decoded() {
    let key = checkpoint_key(BUCKET, "db-1");
    let store = MemoryStore::new().with_object(BUCKET, &key, b"1700000000");

    let checkpoint = read_checkpoint(&store, &RetryPolicy::none(), BUCKET, &key)
        .await
        .unwrap();

    assert_eq!(checkpoint.value(), 1700000000);
}

#[tokio::test]
async fn test_access_denied_is_not_mistaken_for_first_sync() {
    let key = checkpoint_key(BUCKET, "db-1");
    let store = MemoryStore::new()
        .with_object(BUCKET, &key, b"1700000000")
        .fail_gets(RetryErrorType::AuthFailed(403));

    let err = read_checkpoint(&store, &immediate_retry(3), BUCKET, &key)
        .await
        .unwrap_err();

    assert!(matches!(err, ResumeError::Store(ref e) if !e.is_not_found()));
    // Not retryable
    assert_eq!(store.get_count(), 1);
}

#[tokio::test]
async fn test_transient_read_failure_is_retried() {
    let key = checkpoint_key(BUCKET, "db-1");
    let store = MemoryStore::new()
        .with_object(BUCKET, &key, b"42")
        .fail_gets_times(RetryErrorType::ServerError(500), 1);

    let checkpoint = read_checkpoint(&store, &immediate_retry(2), BUCKET, &key)
        .await
        .unwrap();

    assert_eq!(checkpoint.value(), 42);
    assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn test_corrupt_checkpoint_is_reported() {
    let key = checkpoint_key(BUCKET, "db-1");
    let store = MemoryStore::new().with_object(BUCKET, &key, b"not-a-number");

    let err = read_checkpoint(&store, &RetryPolicy::none(), BUCKET, &key)
        .await
        .unwrap_err();

    match err {
        ResumeError::Corrupt { key: corrupt_key, .. } => assert_eq!(corrupt_key, key),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_write_stores_plain_decimal() {
    let store = MemoryStore::new();
    let key = checkpoint_key(BUCKET, "db-1");

    write_checkpoint(&store, &RetryPolicy::none(), BUCKET, &key, Checkpoint::new(1700000500))
        .await
        .unwrap();

    assert_eq!(store.object_text(BUCKET, &key).as_deref(), Some("1700000500"));
}

#[test]
fn test_key_is_deterministic_per_instance() {
    assert_eq!(checkpoint_key(BUCKET, "db-1"), checkpoint_key(BUCKET, "db-1"));
    assert_ne!(checkpoint_key(BUCKET, "db-1"), checkpoint_key(BUCKET, "db-2"));
    assert_eq!(checkpoint_key(BUCKET, "db-1"), "rds-logs/db-1/LOGPOINTER.TXT");
}
