//! Restore of the configured database via `mysql`.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};

use crate::backup::compression::extension_from_filename;
use crate::backup::Compression;
use crate::exec::{CommandRunner, SystemRunner};
use crate::mysql::{store_auth, BackupConfig};

/// Errors on importing a backup.
#[derive(Debug, Display, Error, From)]
pub enum ImportError {
    /// A required binary is neither configured nor on `PATH`.
    #[display("`{_0}` executable not available")]
    ExecutableNotAvailable(#[error(ignore)] String),

    /// The backup file does not exist.
    #[display("File `{}` not found", path.display())]
    FileNotFound { path: PathBuf },

    /// The backup file carries no recognized extension.
    #[display("Invalid file extension: `{name}`")]
    InvalidExtension { name: String },

    /// A pipeline stage exited with a non-zero code.
    #[display("`{}` failed with exit code {exit_code}", command.display())]
    CommandFailed { command: PathBuf, exit_code: i32 },

    /// Reading the backup or the credentials file failed.
    #[from]
    Io(io::Error),
}

/// Imports a backup into the configured database.
///
/// Compressed backups are decompressed with `gzip -dc`/`bzip2 -dc`; the
/// SQL stream is fed to `mysql --defaults-file=<auth> <database>`.
pub struct BackupImport<R = SystemRunner> {
    config: BackupConfig,
    runner: R,
}

impl BackupImport {
    /// Import driven by real child processes.
    pub fn new(config: BackupConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> BackupImport<R> {
    pub fn with_runner(config: BackupConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Restores the database from `filename`; a relative name is looked
    /// up in the target directory.
    ///
    /// Returns the path of the imported backup.
    pub fn import(&self, filename: &Path) -> Result<PathBuf, ImportError> {
        let path = if filename.is_absolute() {
            filename.to_path_buf()
        } else {
            self.config.target.join(filename)
        };
        if !path.is_file() {
            return Err(ImportError::FileNotFound { path });
        }

        let basename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let Some((_, compression)) = extension_from_filename(basename) else {
            return Err(ImportError::InvalidExtension {
                name: basename.to_string(),
            });
        };

        log::info!(
            target: "mysql::import",
            "Restore database `{}` from {}",
            self.config.connection.database,
            path.display()
        );

        let sql = self.decompress(&path, compression)?;

        let mysql = self.bin("mysql")?;
        let auth = store_auth("client", &self.config.connection)?;
        let defaults_file = format!("--defaults-file={}", auth.path().display());

        let args = [
            OsStr::new(defaults_file.as_str()),
            OsStr::new(self.config.connection.database.as_str()),
        ];
        let restore = self.runner.run(&mysql, &args, Some(&sql))?;
        if !restore.success() {
            return Err(ImportError::CommandFailed {
                command: mysql,
                exit_code: restore.exit_code,
            });
        }

        log::info!(target: "mysql::import", "Finished database restore: {}", path.display());
        Ok(path)
    }

    fn decompress(&self, path: &Path, compression: Compression) -> Result<Vec<u8>, ImportError> {
        let binary = match compression {
            Compression::None => return Ok(fs::read(path)?),
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        };

        let command = self.bin(binary)?;
        let args = [OsStr::new("-dc"), path.as_os_str()];
        let decompressed = self.runner.run(&command, &args, None)?;
        if !decompressed.success() {
            return Err(ImportError::CommandFailed {
                command,
                exit_code: decompressed.exit_code,
            });
        }

        Ok(decompressed.stdout)
    }

    fn bin(&self, binary: &str) -> Result<PathBuf, ImportError> {
        self.config
            .bin
            .locate(binary)
            .ok_or_else(|| ImportError::ExecutableNotAvailable(binary.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::mysql::testing::ScriptedRunner;
    use crate::mysql::BinConfig;

    const SQL: &[u8] = b"CREATE TABLE t (id INT);\n";

    fn config(dir: &TempDir) -> BackupConfig {
        BackupConfig {
            target: dir.path().to_path_buf(),
            bin: BinConfig::fake_in(dir.path()),
            ..Default::default()
        }
    }

    #[test]
    fn plain_backup_is_fed_to_mysql() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backup.sql"), SQL).unwrap();
        let import = BackupImport::with_runner(config(&dir), ScriptedRunner::with_stdout(b""));

        let path = import.import(Path::new("backup.sql")).unwrap();
        assert_eq!(dir.path().join("backup.sql"), path);

        let calls = import.runner.calls();
        assert_eq!(1, calls.len());
        assert!(calls[0].command.ends_with("mysql"));
        assert!(calls[0].args[0].to_str().unwrap().starts_with("--defaults-file="));
        assert_eq!("test", calls[0].args[1].to_str().unwrap());
        assert_eq!(Some(SQL.to_vec()), calls[0].stdin);
    }

    #[test]
    fn compressed_backup_is_decompressed_first() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("backup.sql.gz");
        fs::write(&backup, b"\x1f\x8b...").unwrap();
        let import = BackupImport::with_runner(config(&dir), ScriptedRunner::with_stdout(SQL));

        import.import(&backup).unwrap();

        let calls = import.runner.calls();
        assert_eq!(2, calls.len());
        assert!(calls[0].command.ends_with("gzip"));
        assert_eq!("-dc", calls[0].args[0].to_str().unwrap());
        assert_eq!(backup.as_os_str(), calls[0].args[1].as_os_str());
        assert!(calls[1].command.ends_with("mysql"));
        assert_eq!(Some(SQL.to_vec()), calls[1].stdin);
    }

    #[test]
    fn missing_backup_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let import = BackupImport::with_runner(config(&dir), ScriptedRunner::with_stdout(b""));

        let err = import.import(Path::new("nope.sql")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound { .. }));
    }

    #[test]
    fn unrecognized_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backup.txt"), SQL).unwrap();
        let import = BackupImport::with_runner(config(&dir), ScriptedRunner::with_stdout(b""));

        let err = import.import(Path::new("backup.txt")).unwrap_err();
        assert!(matches!(err, ImportError::InvalidExtension { .. }));
    }

    #[test]
    fn missing_mysql_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backup.sql"), SQL).unwrap();
        let mut config = config(&dir);
        config.bin.mysql = Some(dir.path().join("no-such-mysql"));
        let import = BackupImport::with_runner(config, ScriptedRunner::with_stdout(b""));

        let err = import.import(Path::new("backup.sql")).unwrap_err();
        assert!(
            matches!(err, ImportError::ExecutableNotAvailable(ref bin) if bin == "mysql"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn failing_restore_reports_the_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backup.sql"), SQL).unwrap();
        let import = BackupImport::with_runner(config(&dir), ScriptedRunner::failing(1));

        let err = import.import(Path::new("backup.sql")).unwrap_err();
        assert!(matches!(err, ImportError::CommandFailed { exit_code: 1, .. }));
    }
}
