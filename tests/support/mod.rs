//! Scripted in-memory collaborators for driving the sync engine in tests

#![allow(dead_code)]

use async_trait::async_trait;
use rds_log_shipper::directory::{DirectoryError, DirectoryResult, LogDirectory};
use rds_log_shipper::store::{ObjectStore, StoreError, StoreResult};
use rds_log_shipper::sync::retry::{RetryErrorType, RetryPolicy};
use rds_log_shipper::sync::SyncOptions;
use rds_log_shipper::{LogFileDescriptor, LogPortion};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const BUCKET: &str = "rds-logs";

/// Options with no retries, no backoff and no timeouts
pub fn fast_options() -> SyncOptions {
    SyncOptions::new(BUCKET)
        .with_max_retries(0)
        .with_backoff(Duration::ZERO, Duration::ZERO)
        .with_call_timeout(None)
        .with_pass_deadline(None)
}

/// Retry policy with `retries` immediate retries
pub fn immediate_retry(retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries: retries,
        ..RetryPolicy::none()
    }
}

type PortionKey = (String, String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCall {
    pub instance: String,
    pub file: String,
    pub marker: String,
}

/// Log directory answering from a script
///
/// Portions are keyed by `(instance, file, marker)`. Failures can be injected
/// for listings and for individual portions, optionally a limited number of
/// times to exercise retries.
#[derive(Default)]
pub struct MockDirectory {
    instances: Vec<String>,
    files: HashMap<String, Vec<LogFileDescriptor>>,
    portions: HashMap<PortionKey, LogPortion>,
    portion_failures: Mutex<HashMap<PortionKey, (RetryErrorType, u32)>>,
    list_instances_failure: Option<RetryErrorType>,
    list_files_failures: HashMap<String, RetryErrorType>,
    list_files_delay: Option<Duration>,
    download_calls: Mutex<Vec<DownloadCall>>,
    list_files_calls: Mutex<Vec<String>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance and the log files it lists, in listing order
    pub fn with_instance(mut self, instance: &str, files: Vec<LogFileDescriptor>) -> Self {
        self.instances.push(instance.to_string());
        self.files.insert(instance.to_string(), files);
        self
    }

    /// Script the portion returned for `marker`
    pub fn with_portion(mut self, instance: &str, file: &str, marker: &str, portion: LogPortion) -> Self {
        self.portions.insert(key(instance, file, marker), portion);
        self
    }

    /// Script a file that is returned in a single portion
    pub fn with_content(self, instance: &str, file: &str, content: &str) -> Self {
        self.with_portion(instance, file, "0", LogPortion::new("", content, false))
    }

    /// Fail the portion call at `marker` `times` times before answering
    pub fn fail_portion(self, instance: &str, file: &str, marker: &str, error_type: RetryErrorType, times: u32) -> Self {
        self.portion_failures
            .lock()
            .unwrap()
            .insert(key(instance, file, marker), (error_type, times));
        self
    }

    pub fn fail_list_instances(mut self, error_type: RetryErrorType) -> Self {
        self.list_instances_failure = Some(error_type);
        self
    }

    pub fn fail_list_log_files(mut self, instance: &str, error_type: RetryErrorType) -> Self {
        self.list_files_failures.insert(instance.to_string(), error_type);
        self
    }

    /// Delay every log file listing
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_files_delay = Some(delay);
        self
    }

    pub fn download_calls(&self) -> Vec<DownloadCall> {
        self.download_calls.lock().unwrap().clone()
    }

    pub fn downloaded_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for call in self.download_calls() {
            if call.marker == "0" {
                files.push(call.file);
            }
        }
        files
    }

    pub fn log_file_listings(&self) -> Vec<String> {
        self.list_files_calls.lock().unwrap().clone()
    }
}

fn key(instance: &str, file: &str, marker: &str) -> PortionKey {
    (instance.to_string(), file.to_string(), marker.to_string())
}

fn remote(operation: &str, error_type: RetryErrorType) -> DirectoryError {
    DirectoryError::Remote {
        operation: operation.to_string(),
        error_type,
        message: "injected failure".to_string(),
    }
}

#[async_trait]
impl LogDirectory for MockDirectory {
    async fn list_instances(&self) -> DirectoryResult<Vec<String>> {
        if let Some(error_type) = self.list_instances_failure {
            return Err(remote("DescribeDBInstances", error_type));
        }
        Ok(self.instances.clone())
    }

    async fn list_log_files(&self, instance: &str) -> DirectoryResult<Vec<LogFileDescriptor>> {
        self.list_files_calls.lock().unwrap().push(instance.to_string());
        if let Some(delay) = self.list_files_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error_type) = self.list_files_failures.get(instance) {
            return Err(remote("DescribeDBLogFiles", *error_type));
        }
        Ok(self.files.get(instance).cloned().unwrap_or_default())
    }

    async fn download_log_portion(
        &self,
        instance: &str,
        file_name: &str,
        marker: &str,
    ) -> DirectoryResult<LogPortion> {
        self.download_calls.lock().unwrap().push(DownloadCall {
            instance: instance.to_string(),
            file: file_name.to_string(),
            marker: marker.to_string(),
        });

        let portion_key = key(instance, file_name, marker);
        {
            let mut failures = self.portion_failures.lock().unwrap();
            if let Some((error_type, remaining)) = failures.get_mut(&portion_key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(remote("DownloadDBLogFilePortion", *error_type));
                }
            }
        }

        self.portions.get(&portion_key).cloned().ok_or_else(|| {
            DirectoryError::InvalidResponse(format!(
                "no scripted portion for {instance}/{file_name} at marker {marker}"
            ))
        })
    }
}

/// In-memory object store with failure injection
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    get_failure: Option<RetryErrorType>,
    put_failure: Option<RetryErrorType>,
    put_delay: Option<Duration>,
    get_failures_remaining: Mutex<u32>,
    gets: Mutex<u32>,
    puts: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
        self
    }

    /// Fail every read with `error_type`
    pub fn fail_gets(mut self, error_type: RetryErrorType) -> Self {
        self.get_failure = Some(error_type);
        *self.get_failures_remaining.lock().unwrap() = u32::MAX;
        self
    }

    /// Fail the first `times` reads with `error_type`
    pub fn fail_gets_times(mut self, error_type: RetryErrorType, times: u32) -> Self {
        self.get_failure = Some(error_type);
        *self.get_failures_remaining.lock().unwrap() = times;
        self
    }

    /// Fail every write with `error_type`
    pub fn fail_puts(mut self, error_type: RetryErrorType) -> Self {
        self.put_failure = Some(error_type);
        self
    }

    /// Delay every write
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_text(&self, bucket: &str, key: &str) -> Option<String> {
        self.object(bucket, key)
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    pub fn get_count(&self) -> u32 {
        *self.gets.lock().unwrap()
    }

    /// Keys of every attempted write, in order
    pub fn put_keys(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        *self.gets.lock().unwrap() += 1;

        if let Some(error_type) = self.get_failure {
            let mut remaining = self.get_failures_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(StoreError::Remote {
                    operation: "GetObject".to_string(),
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    error_type,
                    message: "injected failure".to_string(),
                });
            }
        }

        self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> StoreResult<()> {
        self.puts.lock().unwrap().push(key.to_string());
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error_type) = self.put_failure {
            return Err(StoreError::Remote {
                operation: "PutObject".to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                error_type,
                message: "injected failure".to_string(),
            });
        }

        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}
