//! Archive location layout for downloaded log files
//!
//! Every archived copy lives at `{instance}/{log file name}/{last written}.log`
//! below the configured root (a key prefix or a local directory). RDS log
//! names contain slashes (`error/postgresql.log.2024-01-01-00`), which map to
//! nested keys or directories. Including `LastWritten` keeps successive
//! versions of a still-growing file apart.

use super::OutputError;
use std::path::PathBuf;

/// Validate a name used as a path segment sequence
///
/// Rejects empty names, absolute names, and `.`/`..` or empty components so a
/// listed file name can never escape the archive root.
pub fn validate_relative_name(name: &str) -> Result<(), OutputError> {
    if name.is_empty() {
        return Err(OutputError::InvalidName("name cannot be empty".to_string()));
    }
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(OutputError::InvalidName(format!("{name:?} is absolute")));
    }
    for component in name.split(['/', '\\']) {
        if component.is_empty() || component == "." || component == ".." {
            return Err(OutputError::InvalidName(format!(
                "{name:?} contains an invalid path component"
            )));
        }
    }
    Ok(())
}

/// Relative archive location for one log file version
pub fn archive_relative_path(
    instance: &str,
    file_name: &str,
    last_written: i64,
) -> Result<String, OutputError> {
    validate_relative_name(instance)?;
    validate_relative_name(file_name)?;
    Ok(format!("{instance}/{file_name}/{last_written}.log"))
}

/// Object key for one log file version under a key prefix
pub fn archive_key(
    prefix: &str,
    instance: &str,
    file_name: &str,
    last_written: i64,
) -> Result<String, OutputError> {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return Err(OutputError::InvalidName(
            "archive prefix cannot be empty".to_string(),
        ));
    }
    let relative = archive_relative_path(instance, file_name, last_written)?;
    Ok(format!("{prefix}/{relative}"))
}

/// Local file path for one log file version under a root directory
pub fn archive_file_path(
    root: &std::path::Path,
    instance: &str,
    file_name: &str,
    last_written: i64,
) -> Result<PathBuf, OutputError> {
    let relative = archive_relative_path(instance, file_name, last_written)?;
    Ok(relative.split('/').fold(root.to_path_buf(), |path, part| path.join(part)))
}
