//! Classification actions: token decode, authorization, and the
//! per-file save-or-skip loop.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, error, info, warn};

use super::BatchEngine;
use crate::error::{Error, Result};
use crate::metadata::TorrentMetadata;
use crate::registry::PendingBatch;
use crate::transport::{result_line, summary_text};
use crate::types::{
    ActionToken, BatchAction, ClassificationEvent, Event, MessageId, ResolveOutcome, Summary,
};
use crate::utils::sanitize_file_name;

impl BatchEngine {
    /// Handle one classification (button press) event
    ///
    /// The batch is removed from the registry *before* any file is
    /// downloaded, so a duplicate action racing this one observes the
    /// missing-batch outcome and touches nothing on disk. Soft outcomes
    /// (expired, wrong owner, cancelled) are returned as data; only a
    /// malformed token or an unusable destination is an error.
    ///
    /// # Errors
    /// Returns [`Error::MalformedToken`] for tokens that do not decode,
    /// and [`Error::DestinationUnavailable`] when the destination
    /// directory cannot be created (the batch stays pending so the owner
    /// can retry).
    pub async fn handle_action(&self, event: ClassificationEvent) -> Result<ResolveOutcome> {
        if !self.config.is_admin(event.user) {
            debug!(user = %event.user, "ignoring action from non-admin");
            return Ok(ResolveOutcome::Ignored);
        }

        self.sweep_expired().await;

        let token = match ActionToken::decode(&event.data) {
            Ok(token) => token,
            Err(e) => {
                warn!(data = %event.data, "received malformed action token");
                self.notice(&event, "Invalid action.").await;
                return Err(e);
            }
        };
        let group_key = token.group_key;

        // Existence and ownership gate; reads only, so a rightful owner
        // can still resolve after a rejected attempt.
        let owner = {
            let registry = self.registry.lock().await;
            registry.get(&group_key).map(|batch| batch.owner)
        };
        match owner {
            None => return self.batch_missing(&event).await,
            Some(owner) if owner != event.user => {
                self.notice(&event, "This batch must be confirmed by the sender.")
                    .await;
                return Ok(ResolveOutcome::NotOwner);
            }
            Some(_) => {}
        }

        let classification = match token.action {
            BatchAction::Cancel => {
                let removed = self.registry.lock().await.remove(&group_key);
                let Some(batch) = removed else {
                    return self.batch_missing(&event).await;
                };
                if let Some(task) = batch.prompt_task {
                    task.abort();
                }
                let prompt = batch.prompt_message_id.unwrap_or(event.message_id);
                self.replace_prompt(&event, prompt, "Canceled.").await;
                info!(group_key = %group_key, "batch cancelled by owner");
                self.emit(Event::BatchCancelled { group_key });
                return Ok(ResolveOutcome::Cancelled);
            }
            BatchAction::Classify(classification) => classification,
        };

        let dest_dir = self.dest_dir(classification);
        if let Err(e) = tokio::fs::create_dir_all(&dest_dir).await {
            warn!(dest = %dest_dir.display(), error = %e, "cannot create destination directory");
            self.notice(&event, "Can't create destination folder.").await;
            return Err(Error::DestinationUnavailable {
                path: dest_dir,
                reason: e.to_string(),
            });
        }

        // Terminal transition: whoever removes the batch processes it.
        // Everything after this point suspends, so the removal must come
        // first.
        let removed = self.registry.lock().await.remove(&group_key);
        let Some(batch) = removed else {
            return self.batch_missing(&event).await;
        };
        if let Some(task) = &batch.prompt_task {
            task.abort();
        }

        let summary = self
            .save_batch_files(&batch, classification, dest_dir)
            .await;

        let prompt = batch.prompt_message_id.unwrap_or(event.message_id);
        self.replace_prompt(&event, prompt, &result_line(&summary))
            .await;
        if let Err(e) = self
            .transport
            .send_message(event.chat, &summary_text(&summary))
            .await
        {
            error!(group_key = %group_key, error = %e, "unable to send batch summary");
        }

        info!(
            group_key = %group_key,
            classification = classification.as_str(),
            saved = summary.saved.len(),
            skipped = summary.skipped.len(),
            errors = summary.errors.len(),
            "batch resolved"
        );
        self.emit(Event::BatchResolved {
            group_key,
            classification,
            saved: summary.saved.len(),
            skipped: summary.skipped.len(),
            errors: summary.errors.len(),
        });
        Ok(ResolveOutcome::Classified(summary))
    }

    /// Run the save-or-skip decision for every file of a removed batch
    ///
    /// Files are processed in arrival order; a failure on one never
    /// aborts the rest. Duplicates within the batch and names already
    /// present at the destination are skipped, never overwritten.
    async fn save_batch_files(
        &self,
        batch: &PendingBatch,
        classification: crate::types::Classification,
        dest_dir: std::path::PathBuf,
    ) -> Summary {
        let mut saved: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for file in &batch.files {
            let Some(name) = sanitize_file_name(&file.name) else {
                warn!(declared = %file.name, "file name normalized away, recording error");
                errors.push("<empty>".to_string());
                continue;
            };

            if !seen.insert(name.clone()) {
                debug!(name = %name, "duplicate within batch, skipping");
                skipped.push(name);
                continue;
            }

            let target = dest_dir.join(&name);
            if target.exists() {
                debug!(name = %name, "already present at destination, skipping");
                skipped.push(name);
                continue;
            }

            match self.sink.download(file, &target).await {
                Ok(()) => saved.push(name),
                Err(e) => {
                    error!(name = %name, error = %e, "unable to save file");
                    errors.push(name);
                }
            }
        }

        // Single-file batches get a torrent-info section when the reader
        // cooperates; any failure just omits it.
        let metadata = if batch.files.len() == 1 && saved.len() == 1 {
            self.read_metadata(&dest_dir.join(&saved[0])).await
        } else {
            None
        };

        Summary {
            classification,
            dest_dir,
            saved,
            skipped,
            errors,
            metadata,
        }
    }

    /// Best-effort metadata extraction from a saved torrent file
    async fn read_metadata(&self, path: &Path) -> Option<TorrentMetadata> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot read saved file for metadata");
                return None;
            }
        };
        match self.metadata.parse(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!(reader = self.metadata.name(), error = %e, "torrent metadata unavailable");
                None
            }
        }
    }

    /// Soft notice for an action against a vanished batch, clearing the
    /// stale keyboard on the prompt the button came from
    async fn batch_missing(&self, event: &ClassificationEvent) -> Result<ResolveOutcome> {
        self.replace_prompt(
            event,
            event.message_id,
            "This batch is already processed or expired.",
        )
        .await;
        Ok(ResolveOutcome::Missing)
    }

    /// Best-effort soft notice to the chat the action came from
    async fn notice(&self, event: &ClassificationEvent, text: &str) {
        if let Err(e) = self.transport.send_message(event.chat, text).await {
            debug!(chat = %event.chat, error = %e, "best-effort notice failed");
        }
    }

    /// Best-effort edit replacing a prompt's text and clearing its keyboard
    async fn replace_prompt(&self, event: &ClassificationEvent, message: MessageId, text: &str) {
        if let Err(e) = self
            .transport
            .edit_prompt(event.chat, message, text, &[])
            .await
        {
            debug!(message = %message, error = %e, "best-effort prompt replacement failed");
        }
    }
}
