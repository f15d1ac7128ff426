//! Dump and restore of a MySQL database through the command line clients.
//!
//! [`BackupExport`] drives `mysqldump`, [`BackupImport`] drives `mysql`;
//! both pipe through `gzip`/`bzip2` when the backup file asks for it.

pub mod export;
pub mod import;

use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::exec::which;

pub use export::{BackupExport, ExportError};
pub use import::{BackupImport, ImportError};

/// Connection parameters handed to `mysqldump` and `mysql`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConnectionConfig {
    /// Name of the database to dump or restore.
    #[serde(default = "default_database")]
    pub database: String,

    /// Database user.
    #[serde(default = "default_user")]
    pub user: String,

    /// Password of the database user.
    #[serde(default)]
    pub password: String,

    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_database() -> String {
    "test".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            user: default_user(),
            password: String::new(),
            host: default_host(),
        }
    }
}

/// Paths of the external binaries.
///
/// Unset binaries are looked up on `PATH` when the command line is
/// resolved.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BinConfig {
    pub mysqldump: Option<PathBuf>,
    pub mysql: Option<PathBuf>,
    pub gzip: Option<PathBuf>,
    pub bzip2: Option<PathBuf>,
}

impl BinConfig {
    /// Resolves the path of `binary`, preferring the configured path over
    /// a `PATH` lookup.
    fn locate(&self, binary: &str) -> Option<PathBuf> {
        let configured = match binary {
            "mysqldump" => &self.mysqldump,
            "mysql" => &self.mysql,
            "gzip" => &self.gzip,
            "bzip2" => &self.bzip2,
            _ => &None,
        };

        match configured {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(_) => None,
            None => which(binary),
        }
    }
}

/// Configuration of backup target and database access.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct BackupConfig {
    /// Directory the backups are written to and rotated in.
    #[serde(default = "default_target")]
    pub target: PathBuf,

    /// Database connection parameters.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Explicit binary paths.
    #[serde(default)]
    pub bin: BinConfig,
}

fn default_target() -> PathBuf {
    PathBuf::from("/tmp/backups")
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            connection: ConnectionConfig::default(),
            bin: BinConfig::default(),
        }
    }
}

/// Writes the credentials defaults-file read by `mysqldump` and `mysql`
/// via `--defaults-file`.
///
/// `section` is `mysqldump` for exports and `client` for imports. The
/// file is deleted again when the returned handle is dropped.
fn store_auth(section: &str, connection: &ConnectionConfig) -> io::Result<NamedTempFile> {
    let mut auth = NamedTempFile::new()?;
    writeln!(auth, "[{section}]")?;
    writeln!(auth, "user={}", connection.user)?;
    writeln!(auth, "password=\"{}\"", connection.password)?;
    write!(auth, "host={}", connection.host)?;
    auth.flush()?;

    Ok(auth)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::ffi::{OsStr, OsString};
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use crate::exec::{CommandOutput, CommandRunner};

    use super::BinConfig;

    /// One invocation recorded by [`ScriptedRunner`].
    #[derive(Debug, Clone)]
    pub(crate) struct RecordedCall {
        pub command: PathBuf,
        pub args: Vec<OsString>,
        pub stdin: Option<Vec<u8>>,
    }

    /// [`CommandRunner`] double that records invocations and answers every
    /// call with a fixed stdout and exit code.
    pub(crate) struct ScriptedRunner {
        calls: RefCell<Vec<RecordedCall>>,
        stdout: Vec<u8>,
        exit_code: i32,
    }

    impl ScriptedRunner {
        pub(crate) fn with_stdout(stdout: &[u8]) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                stdout: stdout.to_vec(),
                exit_code: 0,
            }
        }

        pub(crate) fn failing(exit_code: i32) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                stdout: Vec::new(),
                exit_code,
            }
        }

        pub(crate) fn calls(&self) -> Vec<RecordedCall> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(
            &self,
            command: &Path,
            args: &[&OsStr],
            stdin: Option<&[u8]>,
        ) -> io::Result<CommandOutput> {
            self.calls.borrow_mut().push(RecordedCall {
                command: command.to_path_buf(),
                args: args.iter().map(|arg| arg.to_os_string()).collect(),
                stdin: stdin.map(|bytes| bytes.to_vec()),
            });

            Ok(CommandOutput {
                stdout: self.stdout.clone(),
                exit_code: self.exit_code,
            })
        }
    }

    impl BinConfig {
        /// Config pointing all four binaries at empty files in `dir`, so
        /// path resolution succeeds without the real tools installed.
        pub(crate) fn fake_in(dir: &Path) -> Self {
            let fake = |name: &str| {
                let path = dir.join(name);
                fs::write(&path, b"").expect("fake binary should be writable");
                Some(path)
            };

            Self {
                mysqldump: fake("mysqldump"),
                mysql: fake("mysql"),
                gzip: fake("gzip"),
                bzip2: fake("bzip2"),
            }
        }
    }
}
