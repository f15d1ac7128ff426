//! File naming, compression resolution and rotation of backups.
//!
//! Everything in here is pure local-filesystem logic:
//!
//! - [`compression`]: mapping between the recognized backup extensions
//!   (`sql`, `sql.gz`, `sql.bz2`) and their compression.
//! - [`filename`]: resolving a filename or pattern into a [`BackupDescriptor`].
//! - [`rotation`]: deleting old backups beyond a retention count.

pub mod compression;
pub mod filename;
pub mod rotation;

pub use compression::Compression;
pub use filename::{BackupDescriptor, PatternContext};
