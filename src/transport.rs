//! Chat transport collaborator and message rendering
//!
//! The engine talks to the messaging platform through [`ChatTransport`];
//! polling, command registration, and API retry all live with the
//! embedder. Rendering helpers are kept here so the embedding bot can
//! reuse the exact prompt/summary wording in its own handlers. Wording is
//! a presentation concern — only the counts and their ordering are
//! load-bearing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ActionToken, BatchAction, ChatId, Classification, GroupKey, MessageId, Summary,
};
use crate::utils::format_mb;

/// One inline keyboard button on a classification prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptButton {
    /// Button label shown to the user
    pub label: String,
    /// Compact callback token delivered back on press
    pub token: String,
}

/// Trait for sending and editing messages on the chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message, returning its message id
    ///
    /// # Errors
    /// Returns an error when the platform rejects the send.
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId>;

    /// Send a message with an inline keyboard, returning its message id
    ///
    /// # Errors
    /// Returns an error when the platform rejects the send.
    async fn send_prompt(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &[PromptButton],
    ) -> Result<MessageId>;

    /// Edit an existing message's text and keyboard
    ///
    /// Passing an empty keyboard clears the buttons. The engine treats
    /// edit failures around prompts as best-effort and swallows them.
    ///
    /// # Errors
    /// Returns an error when the platform rejects the edit.
    async fn edit_prompt(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &[PromptButton],
    ) -> Result<()>;
}

/// Prompt text for a batch of `count` files
pub fn prompt_text(count: usize) -> String {
    if count == 1 {
        "Got 1 .torrent file. Where should I put it?".to_string()
    } else {
        format!("Got {count} .torrent files. Where should I put this batch?")
    }
}

/// The Movies / Series / Cancel keyboard for a batch
pub fn classification_keyboard(group_key: &GroupKey) -> Vec<PromptButton> {
    let button = |label: &str, action: BatchAction| PromptButton {
        label: label.to_string(),
        token: ActionToken::new(group_key.clone(), action).encode(),
    };
    vec![
        button("🎬 Movies", BatchAction::Classify(Classification::Movies)),
        button("📺 Series", BatchAction::Classify(Classification::Series)),
        button("✖️ Cancel", BatchAction::Cancel),
    ]
}

/// Short one-line result shown in place of the prompt after resolution
pub fn result_line(summary: &Summary) -> String {
    format!(
        "{}: saved {}, skipped {} (duplicates), errors {}.",
        summary.classification.label(),
        summary.saved.len(),
        summary.skipped.len(),
        summary.errors.len()
    )
}

/// Detailed summary block sent after a batch is resolved
///
/// Folder identity first, then saved/skipped counts, errors only when
/// present, then the torrent-info section when metadata is available.
pub fn summary_text(summary: &Summary) -> String {
    let mut lines = vec![
        format!("Folder: {}", summary.dest_dir.display()),
        format!("Saved: {}", summary.saved.len()),
        format!("Skipped (duplicates): {}", summary.skipped.len()),
    ];
    if !summary.errors.is_empty() {
        lines.push(format!("Errors: {}", summary.errors.len()));
    }

    if let Some(meta) = &summary.metadata {
        lines.push(String::new());
        lines.push("Torrent info:".to_string());
        lines.push(format!("File name: {}", meta.name));
        lines.push(format!("Total size: {}", format_mb(meta.total_size_bytes)));
        lines.push("Files:".to_string());
        if meta.entries.is_empty() {
            lines.push(format!(
                "- {} ({})",
                meta.name,
                format_mb(meta.total_size_bytes)
            ));
        } else {
            for entry in &meta.entries {
                lines.push(format!("- {} ({})", entry.path, format_mb(entry.size_bytes)));
            }
        }
    }

    lines.join("\n")
}
