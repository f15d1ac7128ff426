//! Dump of the configured database via `mysqldump`.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use derive_more::{Display, Error, From};

use crate::backup::filename::{self, FilenameError};
use crate::backup::rotation::{self, RotationError};
use crate::backup::{BackupDescriptor, Compression, PatternContext};
use crate::exec::{CommandRunner, SystemRunner};
use crate::mysql::{store_auth, BackupConfig};

/// Errors on exporting a backup.
#[derive(Debug, Display, Error, From)]
pub enum ExportError {
    /// A required binary is neither configured nor on `PATH`.
    #[display("`{_0}` executable not available")]
    ExecutableNotAvailable(#[error(ignore)] String),

    /// Resolving the backup filename failed.
    #[from]
    Filename(FilenameError),

    /// Rotating old backups after the dump failed.
    #[from]
    Rotation(RotationError),

    /// A pipeline stage exited with a non-zero code.
    #[display("`{}` failed with exit code {exit_code}", command.display())]
    CommandFailed { command: PathBuf, exit_code: i32 },

    /// Writing the dump or the credentials file failed.
    #[from]
    Io(io::Error),
}

/// Exports a backup of the configured database.
///
/// The dump is produced by `mysqldump --defaults-file=<auth> <database>`
/// and piped through `gzip` or `bzip2` when the resolved filename implies
/// a compression.
pub struct BackupExport<R = SystemRunner> {
    config: BackupConfig,
    runner: R,
}

impl BackupExport {
    /// Export driven by real child processes.
    pub fn new(config: BackupConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> BackupExport<R> {
    pub fn with_runner(config: BackupConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Resolves the descriptor for this export without touching the
    /// database.
    ///
    /// Without a `filename` the default `backup_{$DATABASE}_{$DATETIME}`
    /// pattern is used, carrying the extension of `compression`. A given
    /// filename's extension always wins over `compression`.
    pub fn resolve(
        &self,
        name_or_pattern: Option<&str>,
        compression: Option<Compression>,
    ) -> Result<BackupDescriptor, FilenameError> {
        let ctx = PatternContext::for_database(self.config.connection.database.as_str());
        let name = match name_or_pattern {
            Some(name) => name.to_string(),
            None => filename::default_name(compression.unwrap_or_default()),
        };

        filename::build(&self.config.target, &name, compression, &ctx)
    }

    /// Dumps the database into the resolved backup file and applies the
    /// rotation policy when `rotate` is given.
    ///
    /// Returns the path of the written backup.
    pub fn export(
        &self,
        name_or_pattern: Option<&str>,
        compression: Option<Compression>,
        rotate: Option<i64>,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.config.target)?;
        let descriptor = self.resolve(name_or_pattern, compression)?;
        log::info!(
            target: "mysql::export",
            "Dump database `{}` to {}",
            self.config.connection.database,
            descriptor.path.display()
        );

        let mysqldump = self.bin("mysqldump")?;
        let auth = store_auth("mysqldump", &self.config.connection)?;
        let defaults_file = format!("--defaults-file={}", auth.path().display());

        let args = [
            OsStr::new(defaults_file.as_str()),
            OsStr::new(self.config.connection.database.as_str()),
        ];
        let dump = self.runner.run(&mysqldump, &args, None)?;
        if !dump.success() {
            return Err(ExportError::CommandFailed {
                command: mysqldump,
                exit_code: dump.exit_code,
            });
        }

        let bytes = self.compress(dump.stdout, descriptor.compression)?;

        let mut backup_file = File::create_new(&descriptor.path)?;
        backup_file.write_all(&bytes)?;
        log::info!(target: "mysql::export", "Finished database dump: {}", descriptor.path.display());

        if let Some(keep) = rotate {
            rotation::rotate(&self.config.target, keep)?;
        }

        Ok(descriptor.path)
    }

    fn compress(&self, sql: Vec<u8>, compression: Compression) -> Result<Vec<u8>, ExportError> {
        let binary = match compression {
            Compression::None => return Ok(sql),
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        };

        let command = self.bin(binary)?;
        let compressed = self.runner.run(&command, &[], Some(&sql))?;
        if !compressed.success() {
            return Err(ExportError::CommandFailed {
                command,
                exit_code: compressed.exit_code,
            });
        }

        Ok(compressed.stdout)
    }

    fn bin(&self, binary: &str) -> Result<PathBuf, ExportError> {
        self.config
            .bin
            .locate(binary)
            .ok_or_else(|| ExportError::ExecutableNotAvailable(binary.to_string()))
    }
}
