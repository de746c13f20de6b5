//! Checkpoint value and advancement policy
//!
//! A checkpoint is the `LastWritten` timestamp of the most recently captured
//! log file. `0` is the sentinel for "never synced" and sorts below every real
//! timestamp.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// High-watermark timestamp of captured log files for one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint(i64);

impl Checkpoint {
    /// The "never synced" sentinel
    pub const NEVER_SYNCED: Checkpoint = Checkpoint(0);

    /// Wrap a stored timestamp
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw timestamp value
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether this is the "never synced" sentinel
    pub fn is_never_synced(&self) -> bool {
        self.0 == 0
    }

    /// Decide whether a file with this `LastWritten` still has to be downloaded
    pub fn classify(&self, last_written: i64) -> Disposition {
        if self.is_never_synced() || last_written > self.0 {
            Disposition::Due
        } else {
            Disposition::AlreadyCaptured
        }
    }

    /// Decode the stored text form (decimal ASCII, surrounding whitespace allowed)
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| format!("checkpoint is not valid UTF-8: {e}"))?;
        text.parse()
    }

    /// Encode as stored: decimal ASCII without trailing newline
    pub fn encode(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Checkpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches(|c: char| c.is_ascii_whitespace());
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("checkpoint {s:?} is not a non-negative decimal integer"));
        }
        trimmed
            .parse::<i64>()
            .map(Checkpoint)
            .map_err(|e| format!("checkpoint {s:?} is out of range: {e}"))
    }
}

/// Outcome of comparing a log file against the checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Newer than the checkpoint, must be downloaded
    Due,
    /// Not newer than the checkpoint, skipped
    AlreadyCaptured,
}

/// How the next checkpoint is derived from the files downloaded in a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointPolicy {
    /// Take the `LastWritten` of the last downloaded file in listing order.
    ///
    /// Compatible with existing deployments. If the directory lists a newer
    /// file before an older one, the checkpoint moves back to the older value
    /// and the newer file is downloaded again on the next run.
    #[default]
    LastProcessed,
    /// Take the largest `LastWritten` seen across downloaded files
    Maximum,
}

impl CheckpointPolicy {
    /// Fold one downloaded file into the candidate checkpoint
    pub fn advance(&self, candidate: i64, last_written: i64) -> i64 {
        match self {
            CheckpointPolicy::LastProcessed => last_written,
            CheckpointPolicy::Maximum => candidate.max(last_written),
        }
    }
}

impl fmt::Display for CheckpointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckpointPolicy::LastProcessed => "last-processed",
            CheckpointPolicy::Maximum => "maximum",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CheckpointPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-processed" | "last" => Ok(CheckpointPolicy::LastProcessed),
            "maximum" | "max" => Ok(CheckpointPolicy::Maximum),
            _ => Err(format!(
                "Invalid checkpoint policy: {s}. Valid options: last-processed, maximum"
            )),
        }
    }
}
