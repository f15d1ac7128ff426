use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::backup::Compression;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    /// Path of the TOML configuration file.
    #[arg(long, short = 'c', env = "MYSQL_BACKUP_CONFIG", default_value = "mysql_backup.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Dump the configured database to a backup file.
    Export(ExportArgs),

    /// Restore the configured database from a backup file.
    Import(ImportArgs),

    /// Delete old backups beyond a retention count.
    Rotate(RotateArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Filename or pattern of the backup; {$DATABASE}, {$DATETIME},
    /// {$HOSTNAME} and {$TIMESTAMP} are expanded.
    ///
    /// Defaults to `backup_{$DATABASE}_{$DATETIME}` with the extension of
    /// the chosen compression.
    #[arg(long, short = 'f')]
    pub filename: Option<String>,

    /// Compression of the dump; an extension in --filename always wins.
    #[arg(long)]
    pub compression: Option<Compression>,

    /// Keep only the newest N backups after a successful export.
    #[arg(long)]
    pub rotate: Option<i64>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file to restore; a relative path is looked up in the
    /// target directory.
    pub filename: PathBuf,
}

#[derive(Args, Debug)]
pub struct RotateArgs {
    /// Number of newest backups to keep.
    pub keep: i64,
}
