//! CLI error types and conversions

use crate::directory::DirectoryError;
use crate::resume::ResumeError;
use crate::sync::SyncError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Sync run error
    #[error("sync error: {0}")]
    SyncError(#[from] SyncError),

    /// Log directory error
    #[error("log directory error: {0}")]
    DirectoryError(#[from] DirectoryError),

    /// Checkpoint error
    #[error("checkpoint error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Report serialization error
    #[error("failed to render report: {0}")]
    RenderError(#[from] serde_json::Error),

    /// One or more instance passes failed
    #[error("{failed} of {total} sync pass(es) failed")]
    PassesFailed {
        /// Failed passes
        failed: usize,
        /// Passes attempted
        total: usize,
    },

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
