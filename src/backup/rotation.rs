//! Deletion of old backups beyond a retention count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use derive_more::{Display, Error};

use super::compression::extension_from_filename;

/// Errors on rotating old backups.
#[derive(Debug, Display, Error)]
pub enum RotationError {
    /// The retention count must be a positive integer.
    #[display("Invalid rotate value: {_0}")]
    InvalidRotateValue(#[error(ignore)] i64),
    /// The backup directory could not be listed.
    #[display("Reading backup directory `{}` failed: {error}", path.display())]
    DirectoryUnreadable { path: PathBuf, error: io::Error },
}

/// Deletes all but the newest `keep` backup files in `target_dir`.
///
/// Only regular files carrying one of the recognized backup extensions are
/// considered. Files are ordered by modification time, newest first, with
/// ties broken by filename so the order is deterministic. Deletion is
/// best-effort: a file that cannot be removed is logged and skipped.
///
/// Returns the paths that were deleted.
pub fn rotate(target_dir: &Path, keep: i64) -> Result<Vec<PathBuf>, RotationError> {
    if keep < 1 {
        return Err(RotationError::InvalidRotateValue(keep));
    }

    let entries = fs::read_dir(target_dir).map_err(|error| RotationError::DirectoryUnreadable {
        path: target_dir.to_path_buf(),
        error,
    })?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| RotationError::DirectoryUnreadable {
            path: target_dir.to_path_buf(),
            error,
        })?;

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if extension_from_filename(name).is_none() {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        backups.push((modified, name.to_string(), entry.path()));
    }

    // newest first, filename as tiebreak
    backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    let mut deleted = Vec::new();
    for (_, _, path) in backups.into_iter().skip(keep as usize) {
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!(target: "backup::rotation", "Deleted old backup: {}", path.display());
                deleted.push(path);
            }
            Err(e) => {
                log::warn!(target: "backup::rotation", "Deleting `{}` failed: {e}", path.display());
            }
        }
    }

    Ok(deleted)
}
