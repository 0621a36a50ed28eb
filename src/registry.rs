//! In-flight batch registry
//!
//! The registry is the sole source of truth for which batches are
//! pending. It is deliberately in-memory only: a process restart drops
//! pending batches, and the sender simply re-uploads. All operations are
//! synchronous; the engine serializes access behind its own lock and
//! never suspends while holding it, which is what makes `remove` an
//! atomic terminal transition under concurrent resolvers and the reaper.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::types::{ChatId, FileRef, GroupKey, MessageId, UserId};

/// One in-flight batch awaiting a classification decision
#[derive(Debug)]
pub struct PendingBatch {
    /// Chat the batch belongs to
    pub chat: ChatId,
    /// User who may classify the batch (the first file's sender)
    pub owner: UserId,
    /// Files in arrival order; never empty once the batch exists
    pub files: Vec<FileRef>,
    /// Prompt message id once sent; set at most once per batch
    pub prompt_message_id: Option<MessageId>,
    /// Currently armed debounce task, if any
    pub prompt_task: Option<AbortHandle>,
    /// Monotonic creation time, used for TTL
    pub created_at: Instant,
    /// Monotonic time of the latest arrival
    pub last_updated_at: Instant,
}

/// Mapping from group key to its single pending batch
#[derive(Debug, Default)]
pub struct BatchRegistry {
    batches: HashMap<GroupKey, PendingBatch>,
}

impl BatchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file to the batch for `key`, creating the batch on first
    /// arrival. Returns the resulting batch for in-place mutation.
    pub fn upsert(
        &mut self,
        key: GroupKey,
        file: FileRef,
        owner: UserId,
        chat: ChatId,
    ) -> &mut PendingBatch {
        let now = Instant::now();
        let batch = self.batches.entry(key).or_insert_with(|| PendingBatch {
            chat,
            owner,
            files: Vec::new(),
            prompt_message_id: None,
            prompt_task: None,
            created_at: now,
            last_updated_at: now,
        });
        batch.files.push(file);
        batch.last_updated_at = now;
        batch
    }

    /// Look up the batch for `key`
    pub fn get(&self, key: &GroupKey) -> Option<&PendingBatch> {
        self.batches.get(key)
    }

    /// Look up the batch for `key` for mutation
    pub fn get_mut(&mut self, key: &GroupKey) -> Option<&mut PendingBatch> {
        self.batches.get_mut(key)
    }

    /// Remove and return the batch for `key`
    ///
    /// Exactly one caller observes `Some` for a given batch; this is the
    /// at-most-once anchor for resolution, cancellation, and expiry.
    pub fn remove(&mut self, key: &GroupKey) -> Option<PendingBatch> {
        self.batches.remove(key)
    }

    /// Keys of batches created more than `ttl` before `now`
    pub fn keys_older_than(&self, ttl: Duration, now: Instant) -> Vec<GroupKey> {
        self.batches
            .iter()
            .filter(|(_, batch)| now.duration_since(batch.created_at) > ttl)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of pending batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether no batches are pending
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Drain every batch, returning their prompt task handles
    ///
    /// Used by shutdown to abort all armed debounce tasks in one pass.
    pub fn drain_prompt_tasks(&mut self) -> Vec<AbortHandle> {
        self.batches
            .drain()
            .filter_map(|(_, batch)| batch.prompt_task)
            .collect()
    }
}
