//! Library to dump and restore MySQL databases from the command line.
//!
//! The heavy lifting is delegated to the `mysqldump` and `mysql` clients,
//! optionally piped through the `gzip` or `bzip2` binaries. What this
//! library contributes is the [`backup`] module (file naming, compression
//! resolution and rotation of old backups) and the [`mysql`] module
//! driving the external processes through [`exec::CommandRunner`].

#![forbid(unsafe_code)]

pub mod backup;
pub mod cli;
pub mod exec;
pub mod mysql;
