//! Torrent metadata collaborator
//!
//! The engine never parses bencode itself. A [`MetadataReader`]
//! implementation is handed the raw bytes of a saved `.torrent` file and
//! returns the descriptive fields used in the summary message.
//! [`NoOpMetadataReader`] is provided for graceful degradation when no
//! parser is wired in.

use crate::error::{Error, Result};

/// One file entry inside a torrent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TorrentEntry {
    /// Path of the entry inside the torrent
    pub path: String,
    /// Size of the entry in bytes
    pub size_bytes: u64,
}

/// Descriptive fields of a parsed torrent, used only for display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TorrentMetadata {
    /// Torrent name
    pub name: String,
    /// Total payload size in bytes
    pub total_size_bytes: u64,
    /// File entries; empty for single-file torrents (the torrent itself
    /// is the one file, described by `name` and `total_size_bytes`)
    pub entries: Vec<TorrentEntry>,
}

/// Trait for torrent metadata extraction
///
/// Implementations may shell out, use a bencode crate, or stub the
/// operation out entirely; parse failures degrade to an omitted summary
/// section, never to a failed resolution.
pub trait MetadataReader: Send + Sync {
    /// Extract display metadata from raw `.torrent` bytes
    ///
    /// # Errors
    /// Returns an error when the bytes cannot be parsed or the operation
    /// is not supported by this implementation.
    fn parse(&self, bytes: &[u8]) -> Result<TorrentMetadata>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Metadata reader that always reports the operation as unsupported
///
/// Useful for embedders that do not care about the torrent-info section
/// of the summary; everything else works unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMetadataReader;

impl MetadataReader for NoOpMetadataReader {
    fn parse(&self, _bytes: &[u8]) -> Result<TorrentMetadata> {
        Err(Error::MetadataUnavailable(
            "no metadata reader configured".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
