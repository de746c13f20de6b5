//! Integration tests for logging and tracing

use crate::support::{fast_options, MemoryStore, MockDirectory};
use rds_log_shipper::sync::retry::RetryErrorType;
use rds_log_shipper::sync::SyncEngine;
use rds_log_shipper::LogFileDescriptor;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_test_tracing() {
    // Another test may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("rds_log_shipper=trace"))
        .with_test_writer()
        .try_init();
}

#[test]
fn test_env_filter_parsing() {
    assert!(EnvFilter::try_new("rds_log_shipper=info").is_ok());
    assert!(EnvFilter::try_new("warn,rds_log_shipper=debug").is_ok());
}

#[test]
fn test_json_subscriber_builds() {
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("rds_log_shipper=info"))
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(instance = "db-1", file = "error/a.log", "json event");
    });
}

#[tokio::test]
async fn test_pass_with_retries_logs_without_panicking() {
    init_test_tracing();

    let directory = Arc::new(
        MockDirectory::new()
            .with_instance("db-1", vec![LogFileDescriptor::new("error/a.log", 100)])
            .with_content("db-1", "error/a.log", "a")
            .fail_portion("db-1", "error/a.log", "0", RetryErrorType::Throttled, 1),
    );
    let store = Arc::new(MemoryStore::new());

    let report = SyncEngine::new(directory.clone(), store, fast_options().with_max_retries(1))
        .sync_instance("db-1")
        .await
        .unwrap();

    assert_eq!(report.downloaded.len(), 1);
    assert_eq!(directory.download_calls().len(), 2);
}
