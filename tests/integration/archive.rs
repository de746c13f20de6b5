//! Integration tests for archiving downloaded log content

use crate::support::{fast_options, MemoryStore, MockDirectory, BUCKET};
use async_trait::async_trait;
use rds_log_shipper::output::{LogSink, OutputError, OutputResult};
use rds_log_shipper::resume::checkpoint_key;
use rds_log_shipper::sync::{SyncEngine, SyncError};
use rds_log_shipper::{LogFileDescriptor, LogPortion};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const DB: &str = "db-1";
const FILE: &str = "error/postgresql.log.2024-01-01-00";

fn directory() -> Arc<MockDirectory> {
    Arc::new(
        MockDirectory::new()
            .with_instance(DB, vec![LogFileDescriptor::new(FILE, 1704067200000)])
            .with_portion(DB, FILE, "0", LogPortion::new("m1", "first\n", true))
            .with_portion(DB, FILE, "m1", LogPortion::new("m2", "second\n", false)),
    )
}

#[tokio::test]
async fn test_archive_dir_writes_full_content() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let options = fast_options().with_archive_dir(temp_dir.path());

    let report = SyncEngine::new(directory(), store.clone(), options)
        .sync_instance(DB)
        .await
        .unwrap();

    let expected = temp_dir
        .path()
        .join(DB)
        .join("error")
        .join("postgresql.log.2024-01-01-00")
        .join("1704067200000.log");
    assert_eq!(fs::read_to_string(&expected).unwrap(), "first\nsecond\n");
    assert_eq!(
        report.downloaded[0].archived_to.as_deref(),
        Some(expected.display().to_string().as_str())
    );

    // No partial files left behind
    let leftovers: Vec<_> = fs::read_dir(expected.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_archive_prefix_uploads_to_bucket() {
    let store = Arc::new(MemoryStore::new());
    let options = fast_options().with_archive_prefix("archive");

    let report = SyncEngine::new(directory(), store.clone(), options)
        .sync_instance(DB)
        .await
        .unwrap();

    let key = format!("archive/{DB}/{FILE}/1704067200000.log");
    assert_eq!(store.object_text(BUCKET, &key).as_deref(), Some("first\nsecond\n"));
    assert_eq!(
        report.downloaded[0].archived_to.as_deref(),
        Some(format!("s3://{BUCKET}/{key}").as_str())
    );
    // Archive first, checkpoint last
    assert_eq!(store.put_keys(), vec![key, checkpoint_key(BUCKET, DB)]);
}

#[tokio::test]
async fn test_unsafe_file_name_fails_pass_without_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let directory = Arc::new(
        MockDirectory::new()
            .with_instance(DB, vec![LogFileDescriptor::new("../escape.log", 10)])
            .with_content(DB, "../escape.log", "x"),
    );
    let store = Arc::new(MemoryStore::new());
    let options = fast_options().with_archive_dir(temp_dir.path());

    let err = SyncEngine::new(directory, store.clone(), options)
        .sync_instance(DB)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Archive { .. }));
    assert!(store.put_keys().is_empty());
}

/// Sink keeping content in memory, optionally refusing every write
#[derive(Default)]
struct MemorySink {
    written: Mutex<Vec<(String, String)>>,
    refuse: bool,
}

#[async_trait]
impl LogSink for MemorySink {
    async fn write_log(
        &self,
        instance: &str,
        file: &LogFileDescriptor,
        content: &str,
    ) -> OutputResult<String> {
        if self.refuse {
            return Err(OutputError::IoError("disk full".to_string()));
        }
        let location = format!("memory://{instance}/{}", file.name);
        self.written
            .lock()
            .unwrap()
            .push((location.clone(), content.to_string()));
        Ok(location)
    }
}

#[tokio::test]
async fn test_custom_sink_receives_full_content() {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(MemorySink::default());

    let report = SyncEngine::new(directory(), store.clone(), fast_options())
        .with_sink(sink.clone())
        .sync_instance(DB)
        .await
        .unwrap();

    let location = format!("memory://{DB}/{FILE}");
    assert_eq!(
        *sink.written.lock().unwrap(),
        vec![(location.clone(), "first\nsecond\n".to_string())]
    );
    assert_eq!(report.downloaded[0].archived_to.as_deref(), Some(location.as_str()));
    assert_eq!(store.put_keys(), vec![checkpoint_key(BUCKET, DB)]);
}

#[tokio::test]
async fn test_sink_failure_fails_pass_without_checkpoint() {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(MemorySink {
        refuse: true,
        ..MemorySink::default()
    });

    let err = SyncEngine::new(directory(), store.clone(), fast_options())
        .with_sink(sink)
        .sync_instance(DB)
        .await
        .unwrap_err();

    match err {
        SyncError::Archive { file, .. } => assert_eq!(file, FILE),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.put_keys().is_empty());
}
