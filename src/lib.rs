//! # torrent-inbox
//!
//! Batch aggregation and debounced classification engine for torrent
//! inbox bots: files that arrive together on a chat transport are
//! correlated into one batch, the sender is prompted exactly once per
//! batch for a Movies/Series decision, and each file is saved into the
//! chosen bucket with duplicate-checked, at-most-once semantics.
//!
//! ## Design Philosophy
//!
//! torrent-inbox is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Transport-agnostic** - The messaging platform, file fetching, and
//!   torrent parsing are injected collaborators
//! - **In-memory by design** - Pending batches do not survive a restart;
//!   the sender simply re-uploads
//! - **Event-driven** - Consumers subscribe to lifecycle events, no
//!   polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use torrent_inbox::{BatchEngine, Config, NoOpMetadataReader};
//! # use torrent_inbox::{ChatTransport, FileSink};
//! # fn wire_transport() -> Arc<dyn ChatTransport> { unimplemented!() }
//! # fn wire_sink() -> Arc<dyn FileSink> { unimplemented!() }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     admin_ids: vec![torrent_inbox::UserId(123456)],
//!     ..Default::default()
//! };
//!
//! let engine = Arc::new(BatchEngine::new(
//!     config,
//!     wire_transport(),
//!     wire_sink(),
//!     Arc::new(NoOpMetadataReader),
//! )?);
//!
//! // Subscribe to events
//! let mut events = engine.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//! });
//!
//! // Feed `engine.handle_document(..)` and `engine.handle_action(..)`
//! // from the transport's update loop.
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Batch aggregation and classification engine (decomposed into focused submodules)
pub mod engine;
/// Error types
pub mod error;
/// Torrent metadata collaborator
pub mod metadata;
/// In-flight batch registry
pub mod registry;
/// File sink collaborator
pub mod sink;
/// Chat transport collaborator and message rendering
pub mod transport;
/// Core types, events, and action tokens
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{BatchConfig, Config, LibraryConfig, NotifyConfig};
pub use engine::BatchEngine;
pub use error::{Error, Result};
pub use metadata::{MetadataReader, NoOpMetadataReader, TorrentEntry, TorrentMetadata};
pub use registry::{BatchRegistry, PendingBatch};
pub use sink::FileSink;
pub use transport::{ChatTransport, PromptButton};
pub use types::{
    ActionToken, BatchAction, ChatId, Classification, ClassificationEvent, Event, FileRef,
    GroupKey, InboundFile, IntakeOutcome, MessageId, ResolveOutcome, Summary, UserId,
};

use std::sync::Arc;

/// Helper to run the engine until a termination signal, then shut down
/// gracefully.
///
/// Announces shutdown to the primary admin (best-effort) and aborts all
/// armed prompt tasks. The embedding bot keeps feeding events from its
/// own tasks; this only occupies the caller until the signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a Ctrl+C fallback if
///   signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(engine: Arc<BatchEngine>) {
    wait_for_signal().await;
    engine.notify_stopped().await;
    engine.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        }
        // Restricted environments (containers, tests) may refuse signal
        // registration; fall back to ctrl_c.
        _ => {
            tracing::warn!("could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C signal");
    }
}
