//! Resolution of backup filenames and patterns into a [`BackupDescriptor`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use derive_more::{Display, Error};

use super::compression::{extension_from_filename, Compression};

/// Pattern used when the caller supplies no filename of its own.
pub const DEFAULT_PATTERN: &str = "backup_{$DATABASE}_{$DATETIME}";

/// Resolved output target for one dump or restore operation.
///
/// The descriptor carries everything the executor needs: where the file
/// goes and which compression binary, if any, sits in the pipeline. The
/// builder never creates the file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDescriptor {
    /// Absolute path of the backup file.
    pub path: PathBuf,
    /// Compression implied by the file extension.
    pub compression: Compression,
    /// The recognized extension (`sql`, `sql.gz` or `sql.bz2`).
    pub extension: &'static str,
}

/// Substitution values for the four filename placeholders.
#[derive(Debug, Clone)]
pub struct PatternContext {
    /// Replaces `{$DATABASE}`.
    pub database: String,
    /// Replaces `{$HOSTNAME}`.
    pub hostname: String,
    /// Replaces `{$DATETIME}` (as `YYYYMMDDHHMMSS`) and `{$TIMESTAMP}`
    /// (as Unix epoch seconds).
    pub now: DateTime<Local>,
}

impl PatternContext {
    /// Context for `database` with the local hostname and current time.
    pub fn for_database(database: impl Into<String>) -> Self {
        let hostname = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());

        Self {
            database: database.into(),
            hostname,
            now: Local::now(),
        }
    }

    fn expand(&self, pattern: &str) -> String {
        pattern
            .replace("{$DATABASE}", &self.database)
            .replace("{$DATETIME}", &self.now.format("%Y%m%d%H%M%S").to_string())
            .replace("{$HOSTNAME}", &self.hostname)
            .replace("{$TIMESTAMP}", &self.now.timestamp().to_string())
    }
}

/// Errors on resolving a backup filename.
#[derive(Debug, Display, Error)]
pub enum FilenameError {
    /// Filename does not end in `sql`, `sql.gz` or `sql.bz2`.
    #[display("Invalid file extension: `{name}`")]
    InvalidExtension { name: String },
    /// Destination directory is missing or not writable.
    #[display("File or directory `{}` not writable", path.display())]
    DirectoryNotWritable { path: PathBuf },
    /// A file already exists at the resolved path.
    #[display("File `{}` already exists", path.display())]
    FileAlreadyExists { path: PathBuf },
}

/// Resolves `name_or_pattern` into a [`BackupDescriptor`].
///
/// An absolute `name_or_pattern` is used as-is, anything else is joined to
/// `target_dir`. The placeholders `{$DATABASE}`, `{$DATETIME}`,
/// `{$HOSTNAME}` and `{$TIMESTAMP}` are expanded in the basename.
///
/// The compression is derived from the resolved extension and always wins
/// over `compression_override`; the override only matters to callers that
/// feed it into [`default_name`] beforehand.
pub fn build(
    target_dir: &Path,
    name_or_pattern: &str,
    compression_override: Option<Compression>,
    ctx: &PatternContext,
) -> Result<BackupDescriptor, FilenameError> {
    let given = Path::new(name_or_pattern);
    let mut path = if given.is_absolute() {
        given.to_path_buf()
    } else {
        target_dir.join(given)
    };

    // placeholders are expanded in the basename only
    if let Some(basename) = path.file_name().and_then(|name| name.to_str()) {
        let expanded = ctx.expand(basename);
        path.set_file_name(expanded);
    }

    let basename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let Some((extension, compression)) = extension_from_filename(basename) else {
        return Err(FilenameError::InvalidExtension {
            name: name_or_pattern.to_string(),
        });
    };

    if let Some(requested) = compression_override {
        if requested != compression {
            log::debug!(
                target: "backup::filename",
                "Compression `{requested}` overridden by filename extension `{extension}`"
            );
        }
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => target_dir,
    };
    if !dir.is_dir() || tempfile::tempfile_in(dir).is_err() {
        return Err(FilenameError::DirectoryNotWritable {
            path: dir.to_path_buf(),
        });
    }

    if path.exists() {
        return Err(FilenameError::FileAlreadyExists { path });
    }

    Ok(BackupDescriptor {
        path,
        compression,
        extension,
    })
}

/// Default filename for `compression`: the [`DEFAULT_PATTERN`] with the
/// extension the compression implies.
pub fn default_name(compression: Compression) -> String {
    format!("{DEFAULT_PATTERN}.{}", compression.extension())
}
