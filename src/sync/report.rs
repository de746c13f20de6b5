//! Pass reports

use crate::resume::Checkpoint;
use serde::Serialize;

/// A file downloaded during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
    /// Log file name
    pub name: String,
    /// `LastWritten` reported by the directory
    pub last_written: i64,
    /// Bytes of content downloaded
    pub bytes: usize,
    /// Portions fetched
    pub pages: usize,
    /// Where the content was archived, if archiving is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_to: Option<String>,
}

/// Outcome of the end-of-pass checkpoint write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckpointWrite {
    /// Not attempted yet
    Pending,
    /// Written successfully
    Written,
    /// Write failed; the pass still counts as completed
    Failed {
        /// Error message
        error: String,
    },
}

/// Summary of one pass over one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Database instance identifier
    pub instance: String,
    /// Checkpoint object key
    pub checkpoint_key: String,
    /// Checkpoint read at the start of the pass
    pub previous_checkpoint: Checkpoint,
    /// Checkpoint computed at the end of the pass
    pub next_checkpoint: Checkpoint,
    /// Files downloaded, in processing order
    pub downloaded: Vec<DownloadedFile>,
    /// Names of files skipped as already captured
    pub skipped: Vec<String>,
    /// Result of writing `next_checkpoint`
    pub checkpoint_write: CheckpointWrite,
}

impl SyncReport {
    /// Start a report for a pass
    pub fn new(
        instance: impl Into<String>,
        checkpoint_key: impl Into<String>,
        previous_checkpoint: Checkpoint,
    ) -> Self {
        Self {
            instance: instance.into(),
            checkpoint_key: checkpoint_key.into(),
            previous_checkpoint,
            next_checkpoint: previous_checkpoint,
            downloaded: Vec::new(),
            skipped: Vec::new(),
            checkpoint_write: CheckpointWrite::Pending,
        }
    }

    /// Total bytes downloaded in this pass
    pub fn total_bytes(&self) -> usize {
        self.downloaded.iter().map(|file| file.bytes).sum()
    }

    /// Whether the checkpoint write succeeded
    pub fn checkpoint_saved(&self) -> bool {
        self.checkpoint_write == CheckpointWrite::Written
    }
}
