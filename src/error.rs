//! Error types for torrent-inbox
//!
//! Hard failures that cross the API boundary live here. Soft, expected
//! outcomes of handling an event (batch expired, wrong owner, unsupported
//! file, ...) are modeled as data — see [`crate::types::IntakeOutcome`]
//! and [`crate::types::ResolveOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for torrent-inbox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for torrent-inbox
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "library_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Classification callback token that does not round-trip
    #[error("malformed action token: {0:?}")]
    MalformedToken(String),

    /// Chat transport send/edit failure
    ///
    /// Raised by [`crate::transport::ChatTransport`] implementations; the
    /// engine swallows these around best-effort prompt edits and admin
    /// notifications, and surfaces them everywhere else.
    #[error("transport error: {0}")]
    Transport(String),

    /// Destination directory could not be created
    ///
    /// The batch stays pending; the owner may retry the classification.
    #[error("destination unavailable: {path}: {reason}")]
    DestinationUnavailable {
        /// The directory that could not be created
        path: PathBuf,
        /// Why creation failed
        reason: String,
    },

    /// File download failure reported by the [`crate::sink::FileSink`]
    #[error("download failed for {name}: {reason}")]
    Download {
        /// Declared file name of the failed download
        name: String,
        /// Why the download failed
        reason: String,
    },

    /// Torrent metadata could not be parsed (or no parser is wired in)
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),
}

impl Error {
    /// Shorthand for a configuration error with a known key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
