//! Batch aggregation and classification engine, split into focused submodules.
//!
//! The `BatchEngine` struct and its methods are organized by concern:
//! - [`intake`] - Inbound document handling and prompt debouncing
//! - [`resolve`] - Classification actions and per-file save-or-skip
//! - [`notify`] - Welcome, health, and admin lifecycle notices

mod intake;
mod notify;
mod resolve;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::metadata::MetadataReader;
use crate::registry::BatchRegistry;
use crate::sink::FileSink;
use crate::transport::ChatTransport;
use crate::types::{Classification, Event};

/// Capacity of the event broadcast channel; slow subscribers lag, they
/// never block the engine.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The batch aggregation and debounced classification engine
///
/// Owns the in-flight batch registry and drives the full batch
/// lifecycle: correlation of near-simultaneous uploads, the debounced
/// classification prompt, TTL expiry, and exactly-once resolution.
/// Transport, file fetching, and torrent parsing are injected
/// collaborators.
///
/// All shared state is behind a single async lock that is never held
/// across a suspension point, so concurrent handlers interleave safely.
pub struct BatchEngine {
    /// Static configuration
    pub(crate) config: Config,
    /// In-flight batches; the sole shared mutable resource
    pub(crate) registry: tokio::sync::Mutex<BatchRegistry>,
    /// Outbound messaging collaborator
    pub(crate) transport: Arc<dyn ChatTransport>,
    /// File download collaborator
    pub(crate) sink: Arc<dyn FileSink>,
    /// Torrent metadata collaborator (display only)
    pub(crate) metadata: Arc<dyn MetadataReader>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl BatchEngine {
    /// Create an engine from a validated configuration and collaborators
    ///
    /// # Errors
    /// Returns an error if the configuration fails validation.
    pub fn new(
        config: Config,
        transport: Arc<dyn ChatTransport>,
        sink: Arc<dyn FileSink>,
        metadata: Arc<dyn MetadataReader>,
    ) -> Result<Self> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        info!(
            library_dir = %config.library.root_dir.display(),
            metadata_reader = metadata.name(),
            "batch engine created"
        );
        Ok(Self {
            config,
            registry: tokio::sync::Mutex::new(BatchRegistry::new()),
            transport,
            sink,
            metadata,
            event_tx,
        })
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of batches currently awaiting classification
    pub async fn pending_batches(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Remove batches older than the TTL and cancel their prompt tasks
    ///
    /// Invoked opportunistically at the start of every inbound event;
    /// worst-case staleness is the TTL plus the gap to the next event.
    /// Expiry is silent garbage collection: an [`Event::BatchExpired`] is
    /// broadcast, nothing is sent to chat. Returns the number of batches
    /// removed.
    pub async fn sweep_expired(&self) -> usize {
        let expired = {
            let mut registry = self.registry.lock().await;
            let stale = registry.keys_older_than(self.config.batch.ttl, Instant::now());
            let mut removed = Vec::with_capacity(stale.len());
            for key in stale {
                if let Some(batch) = registry.remove(&key) {
                    if let Some(task) = batch.prompt_task {
                        task.abort();
                    }
                    removed.push(key);
                }
            }
            removed
        };

        for key in &expired {
            debug!(group_key = %key, "pending batch expired");
            self.emit(Event::BatchExpired {
                group_key: key.clone(),
            });
        }
        expired.len()
    }

    /// Abort all armed prompt tasks and drop every pending batch
    ///
    /// Pending batches are in-memory only; the sender re-uploads after a
    /// restart.
    pub async fn shutdown(&self) {
        let handles = self.registry.lock().await.drain_prompt_tasks();
        for handle in &handles {
            handle.abort();
        }
        info!(aborted_prompts = handles.len(), "batch engine shut down");
    }

    /// Destination directory for a classification bucket
    pub(crate) fn dest_dir(&self, classification: Classification) -> PathBuf {
        let subdir = match classification {
            Classification::Movies => &self.config.library.movies_subdir,
            Classification::Series => &self.config.library.series_subdir,
        };
        self.config.library.root_dir.join(subdir)
    }

    /// Broadcast an event, ignoring the no-subscriber case
    pub(crate) fn emit(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }
}
