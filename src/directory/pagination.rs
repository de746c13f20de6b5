//! Marker-based download of a complete log file
//!
//! The directory hands out a file in portions. Each portion carries the marker
//! for the next call and a flag saying whether more data is pending. The loop
//! below keeps calling until the flag clears, accumulating into one buffer.
//!
//! Safety mechanisms:
//! - Page cap so a remote that never clears its flag cannot loop forever
//! - A pending portion without a marker is rejected instead of restarting at "0"

use super::{DirectoryError, DirectoryResult, LogDirectory};
use crate::sync::config::INITIAL_MARKER;
use crate::sync::retry::{with_retry, RetryPolicy};
use tracing::debug;

/// A fully downloaded log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedLog {
    /// Concatenated content of every portion
    pub content: String,
    /// Number of portions fetched
    pub pages: usize,
}

impl DownloadedLog {
    /// Size of the content in bytes
    pub fn bytes(&self) -> usize {
        self.content.len()
    }
}

/// Download the complete content of one log file
///
/// # Arguments
/// * `directory` - Log directory to read from
/// * `retry` - Retry policy applied to every portion call
/// * `instance` - Database instance identifier
/// * `file_name` - Log file to download
/// * `max_pages` - Page cap
///
/// # Errors
/// Returns the first error of any portion call (after retries), an
/// `InvalidResponse` for a pending portion without marker, or
/// `PaginationLimit` once `max_pages` portions were fetched and more is pending.
pub async fn download_log_file(
    directory: &dyn LogDirectory,
    retry: &RetryPolicy,
    instance: &str,
    file_name: &str,
    max_pages: usize,
) -> DirectoryResult<DownloadedLog> {
    let mut content = String::new();
    let mut marker = INITIAL_MARKER.to_string();
    let mut pages = 0;
    let target = format!("{instance}/{file_name}");

    loop {
        if pages >= max_pages {
            return Err(DirectoryError::PaginationLimit {
                file: file_name.to_string(),
                pages,
            });
        }

        debug!(
            instance,
            file = file_name,
            marker = %marker,
            page = pages + 1,
            "Downloading log file portion"
        );

        let portion = with_retry(retry, "DownloadDBLogFilePortion", &target, || {
            directory.download_log_portion(instance, file_name, &marker)
        })
        .await?;
        pages += 1;

        content.push_str(&portion.data);

        if !portion.more_pending {
            break;
        }

        if portion.marker.is_empty() {
            return Err(DirectoryError::InvalidResponse(format!(
                "portion {pages} of {file_name} reports pending data without a marker"
            )));
        }

        marker = portion.marker;
    }

    debug!(
        instance,
        file = file_name,
        pages,
        bytes = content.len(),
        "Log file download complete"
    );

    Ok(DownloadedLog {
        content,
        pages,
    })
}
