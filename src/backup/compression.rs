//! Mapping between backup file extensions and compression types.

use clap::ValueEnum;
use derive_more::{Display, Error};
use regex::Regex;

/// Compression applied to a backup file.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Display, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Plain `.sql` dump, no compression.
    #[default]
    #[display("none")]
    None,
    /// Compression through the `gzip` binary (`.sql.gz`).
    #[display("gzip")]
    Gzip,
    /// Compression through the `bzip2` binary (`.sql.bz2`).
    #[display("bzip2")]
    Bzip2,
}

/// Extension to compression mapping, longest extension first so that
/// `sql.gz` is never mis-matched as `sql`.
const EXTENSION_TABLE: [(&str, Compression); 3] = [
    ("sql.bz2", Compression::Bzip2),
    ("sql.gz", Compression::Gzip),
    ("sql", Compression::None),
];

/// Extension is none of `sql`, `sql.gz`, `sql.bz2`.
#[derive(Debug, Display, Error)]
#[display("Unknown extension: {_0}")]
pub struct UnknownExtension(#[error(ignore)] pub String);

impl Compression {
    /// Compression implied by an exact extension such as `sql.gz`.
    pub fn from_extension(extension: &str) -> Result<Self, UnknownExtension> {
        EXTENSION_TABLE
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, compression)| *compression)
            .ok_or_else(|| UnknownExtension(extension.to_string()))
    }

    /// Extension implied by this compression; [`Compression::None`] maps to `sql`.
    pub fn extension(self) -> &'static str {
        EXTENSION_TABLE
            .iter()
            .find(|(_, compression)| *compression == self)
            .map(|(ext, _)| *ext)
            .unwrap_or("sql")
    }
}

/// Extension and compression carried by `filename`, if any.
///
/// The match anchors on the full multi-part suffix, so an arbitrary
/// filename ending in `.gz` is not recognized as a backup.
pub fn extension_from_filename(filename: &str) -> Option<(&'static str, Compression)> {
    let re = Regex::new(r"\.(sql(\.(gz|bz2))?)$").expect("extension regex should be valid");
    let extension = re.captures(filename)?.get(1)?.as_str();

    EXTENSION_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_compression_round_trip() {
        for (ext, _) in EXTENSION_TABLE {
            let compression = Compression::from_extension(ext).unwrap();
            assert_eq!(ext, compression.extension());
        }
    }

    #[test]
    fn from_extension_is_exact_match() {
        assert_eq!(
            Compression::Gzip,
            Compression::from_extension("sql.gz").unwrap()
        );
        assert!(Compression::from_extension("gz").is_err());
        assert!(Compression::from_extension("sql.xz").is_err());
        assert!(Compression::from_extension("").is_err());
    }

    #[test]
    fn none_maps_to_plain_sql() {
        assert_eq!("sql", Compression::None.extension());
    }

    #[test]
    fn filename_suffix_is_anchored() {
        assert_eq!(
            Some(("sql.gz", Compression::Gzip)),
            extension_from_filename("backup.sql.gz")
        );
        assert_eq!(
            Some(("sql.bz2", Compression::Bzip2)),
            extension_from_filename("backup.sql.bz2")
        );
        assert_eq!(
            Some(("sql", Compression::None)),
            extension_from_filename("backup.sql")
        );

        // `.gz` alone is not a backup suffix
        assert_eq!(None, extension_from_filename("archive.tar.gz"));
        assert_eq!(None, extension_from_filename("backup.txt"));
        assert_eq!(None, extension_from_filename("sql"));
        assert_eq!(None, extension_from_filename("backup.sql.gz.txt"));
    }

    #[test]
    fn display_matches_identifier() {
        assert_eq!("none", Compression::None.to_string());
        assert_eq!("gzip", Compression::Gzip.to_string());
        assert_eq!("bzip2", Compression::Bzip2.to_string());
    }
}
