//! Inbound document handling and prompt debouncing.

use std::sync::Arc;

use tracing::{debug, warn};

use super::BatchEngine;
use crate::error::Result;
use crate::transport::{classification_keyboard, prompt_text};
use crate::types::{Event, GroupKey, InboundFile, IntakeOutcome};
use crate::utils::is_torrent_file;

impl BatchEngine {
    /// Handle one inbound document event
    ///
    /// Non-admin senders are dropped silently; non-`.torrent` files are
    /// rejected with a reply. Accepted files join the batch for their
    /// group key (created on first arrival), and the classification
    /// prompt is debounced: every arrival replaces the armed prompt task,
    /// so a burst produces exactly one prompt showing the final count.
    /// Once a prompt exists, later arrivals edit it in place instead.
    ///
    /// # Errors
    /// Returns an error when the rejection reply cannot be sent.
    pub async fn handle_document(self: &Arc<Self>, event: InboundFile) -> Result<IntakeOutcome> {
        if !self.config.is_admin(event.user) {
            debug!(user = %event.user, "ignoring document from non-admin");
            return Ok(IntakeOutcome::Ignored);
        }

        self.sweep_expired().await;

        if !is_torrent_file(&event.document.name) {
            debug!(name = %event.document.name, "rejecting non-torrent document");
            self.transport
                .send_message(event.chat, "Only .torrent files are supported.")
                .await?;
            return Ok(IntakeOutcome::Unsupported);
        }

        let group_key = GroupKey::for_file(&event);
        let (created, files, prompt_message_id) = {
            let mut registry = self.registry.lock().await;
            let created = registry.get(&group_key).is_none();
            let batch = registry.upsert(
                group_key.clone(),
                event.document.clone(),
                event.user,
                event.chat,
            );

            // Re-arm the debounce: the freshest arrival owns the prompt
            if let Some(task) = batch.prompt_task.take() {
                task.abort();
            }
            let task = tokio::spawn(Arc::clone(self).prompt_after_debounce(group_key.clone()));
            batch.prompt_task = Some(task.abort_handle());

            (created, batch.files.len(), batch.prompt_message_id)
        };

        if created {
            self.emit(Event::BatchCreated {
                group_key: group_key.clone(),
                chat: event.chat,
            });
        } else {
            self.emit(Event::FileAdded {
                group_key: group_key.clone(),
                files,
            });
        }

        // A previous burst already rendered a prompt: refresh its count
        // in place. Transient edit races are tolerated silently.
        if let Some(message) = prompt_message_id {
            if let Err(e) = self
                .transport
                .edit_prompt(
                    event.chat,
                    message,
                    &prompt_text(files),
                    &classification_keyboard(&group_key),
                )
                .await
            {
                debug!(group_key = %group_key, error = %e, "best-effort prompt edit failed");
            }
        }

        Ok(IntakeOutcome::Accepted { group_key, files })
    }

    /// Debounce task body: sleep the quiet period, then render the prompt
    ///
    /// Exits without side effects when the batch has since been resolved,
    /// cancelled, or expired, or when a prompt already exists. A send
    /// failure drops the batch — the prompt never reached the user, so
    /// leaving the batch pending would strand it until the TTL.
    async fn prompt_after_debounce(self: Arc<Self>, group_key: GroupKey) {
        tokio::time::sleep(self.config.batch.debounce).await;

        let (chat, files) = {
            let registry = self.registry.lock().await;
            match registry.get(&group_key) {
                Some(batch) if batch.prompt_message_id.is_none() => {
                    (batch.chat, batch.files.len())
                }
                _ => return,
            }
        };

        let text = prompt_text(files);
        let keyboard = classification_keyboard(&group_key);
        match self.transport.send_prompt(chat, &text, &keyboard).await {
            Ok(message_id) => {
                let mut registry = self.registry.lock().await;
                if let Some(batch) = registry.get_mut(&group_key) {
                    if batch.prompt_message_id.is_none() {
                        batch.prompt_message_id = Some(message_id);
                    }
                }
                drop(registry);
                self.emit(Event::PromptSent { group_key, files });
            }
            Err(e) => {
                warn!(group_key = %group_key, error = %e, "failed to send batch prompt, dropping batch");
                self.registry.lock().await.remove(&group_key);
            }
        }
    }
}
