//! Sync configuration constants and options

use std::path::PathBuf;
use std::time::Duration;

use crate::resume::CheckpointPolicy;

/// Maximum number of retries for a failed remote call.
/// 5 retries with exponential backoff rides out throttling and short outages
/// while keeping the worst case around one minute per call.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Per-call timeout applied around every remote operation.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;

/// Deadline for one whole pass over an instance.
pub const DEFAULT_PASS_TIMEOUT_SECS: u64 = 1800;

/// Upper bound on portions fetched for one log file.
/// RDS returns up to 1 MB per portion, so this allows files far larger than
/// RDS retains while still stopping a remote that never clears its flag.
pub const DEFAULT_MAX_PAGES: usize = 100_000;

/// Marker that starts a log file download from its first byte
pub const INITIAL_MARKER: &str = "0";

/// Name of the checkpoint object under each instance prefix
pub const CHECKPOINT_FILE_NAME: &str = "LOGPOINTER.TXT";

/// Region used when neither `--region` nor `AWS_REGION` is set
pub const DEFAULT_REGION: &str = "us-west-2";

/// Exponential backoff `initial * 2^retry_count`, capped at `max`
pub fn backoff_between(initial: Duration, max: Duration, retry_count: u32) -> Duration {
    let factor = 2u32.checked_pow(retry_count).unwrap_or(u32::MAX);
    initial.saturating_mul(factor).min(max)
}

/// Which database instances a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceSelection {
    /// Only the first instance the directory lists
    First,
    /// Exactly one named instance
    Named(String),
    /// Every listed instance, one pass each
    All,
}

impl InstanceSelection {
    /// Pick the instances to sync from a directory listing.
    ///
    /// Returns `None` when a named instance is not listed.
    pub fn select(&self, listed: &[String]) -> Option<Vec<String>> {
        match self {
            InstanceSelection::First => listed.first().map(|first| vec![first.clone()]),
            InstanceSelection::Named(name) => listed
                .iter()
                .find(|candidate| *candidate == name)
                .map(|found| vec![found.clone()]),
            InstanceSelection::All => Some(listed.to_vec()),
        }
    }
}

/// Options for one [`super::SyncEngine`]
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Destination bucket holding checkpoints (and archived logs)
    pub bucket: String,
    /// How the next checkpoint is derived from downloaded files
    pub checkpoint_policy: CheckpointPolicy,
    /// Retries after the first attempt of each remote call
    pub max_retries: u32,
    /// First backoff delay
    pub initial_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
    /// Timeout for a single remote call
    pub call_timeout: Option<Duration>,
    /// Deadline for a whole pass
    pub pass_deadline: Option<Duration>,
    /// Page cap for a single log file download
    pub max_pages: usize,
    /// Key prefix for archiving content into the destination bucket
    pub archive_prefix: Option<String>,
    /// Local directory for archiving content
    pub archive_dir: Option<PathBuf>,
}

impl SyncOptions {
    /// Options with production defaults for the given bucket
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            checkpoint_policy: CheckpointPolicy::default(),
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            call_timeout: Some(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS)),
            pass_deadline: Some(Duration::from_secs(DEFAULT_PASS_TIMEOUT_SECS)),
            max_pages: DEFAULT_MAX_PAGES,
            archive_prefix: None,
            archive_dir: None,
        }
    }

    /// Set the checkpoint policy
    pub fn with_checkpoint_policy(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoint_policy = policy;
        self
    }

    /// Set the number of retries per remote call
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override backoff bounds
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set or clear the per-call timeout
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set or clear the pass deadline
    pub fn with_pass_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.pass_deadline = deadline;
        self
    }

    /// Set the page cap for a single file
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Archive downloaded content into the bucket under this prefix
    pub fn with_archive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.archive_prefix = Some(prefix.into());
        self
    }

    /// Archive downloaded content into a local directory
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// Validate option values
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("bucket name cannot be empty".to_string());
        }
        if self.max_pages == 0 {
            return Err("max pages must be at least 1".to_string());
        }
        if let Some(prefix) = &self.archive_prefix {
            if prefix.trim_matches('/').is_empty() {
                return Err("archive prefix cannot be empty".to_string());
            }
            if self.archive_dir.is_some() {
                return Err("archive prefix and archive directory are mutually exclusive".to_string());
            }
        }
        Ok(())
    }
}
