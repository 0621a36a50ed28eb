//! Welcome, health, and admin lifecycle notices.

use tracing::{debug, warn};

use super::BatchEngine;
use crate::error::Result;
use crate::types::{ChatId, MessageId, UserId};
use crate::utils::{uptime_message, write_health_trigger};

impl BatchEngine {
    /// Handle the start command: greet an admin, ignore everyone else
    ///
    /// Returns the id of the welcome message, or `None` when the sender
    /// was silently ignored.
    ///
    /// # Errors
    /// Returns an error when the welcome message cannot be sent.
    pub async fn handle_start(
        &self,
        chat: ChatId,
        user: UserId,
        user_name: &str,
    ) -> Result<Option<MessageId>> {
        if !self.config.is_admin(user) {
            debug!(user = %user, "ignoring start command from non-admin");
            return Ok(None);
        }
        let text = format!(
            "Hi, {user_name}.\n\n\
             Send .torrent files (single or batch). I'll ask Movies/Series \
             and save them to the right folder.\n\n{}",
            uptime_message()
        );
        let id = self.transport.send_message(chat, &text).await?;
        Ok(Some(id))
    }

    /// Handle the health command: write the host-side trigger file and
    /// acknowledge
    ///
    /// Returns `false` when the sender was silently ignored.
    ///
    /// # Errors
    /// Returns an error when the trigger file cannot be written or the
    /// acknowledgement cannot be sent.
    pub async fn handle_health(&self, chat: ChatId, user: UserId) -> Result<bool> {
        if !self.config.is_admin(user) {
            debug!(user = %user, "ignoring health command from non-admin");
            return Ok(false);
        }
        write_health_trigger(&self.config.notify.health_trigger_path)?;
        self.transport
            .send_message(chat, "/health accepted. Running host healthcheck...")
            .await?;
        Ok(true)
    }

    /// Announce startup to the primary admin (best-effort)
    pub async fn notify_started(&self) {
        self.notify_admin("torrent inbox started").await;
    }

    /// Announce shutdown to the primary admin (best-effort)
    pub async fn notify_stopped(&self) {
        self.notify_admin("torrent inbox shutting down").await;
    }

    /// Best-effort operational notice to the first configured admin,
    /// with the host uptime appended
    async fn notify_admin(&self, message: &str) {
        let Some(admin) = self.config.primary_admin() else {
            return;
        };
        let text = format!("{message}\n\n{}", uptime_message());
        if let Err(e) = self.transport.send_message(ChatId(admin.0), &text).await {
            warn!(admin = %admin, error = %e, "failed to send admin notification");
        }
    }
}
