//! File sink collaborator
//!
//! Fetching the bytes behind a transport file handle is owned by the
//! transport layer; the engine only decides *whether* and *where* a file
//! is written. Retry/backoff of the transport API is likewise out of
//! scope here.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::FileRef;

/// Trait for downloading a transport file handle to a destination path
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Download the file behind `file.handle` and write it to `dest`
    ///
    /// The destination directory is guaranteed to exist when the engine
    /// calls this. Implementations should not overwrite-check; the engine
    /// performs the duplicate-on-disk skip before calling.
    ///
    /// # Errors
    /// Returns an error when the transport fetch or the disk write fails.
    /// The engine records the failure against the single file and keeps
    /// processing the rest of the batch.
    async fn download(&self, file: &FileRef, dest: &Path) -> Result<()>;
}
