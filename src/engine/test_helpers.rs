//! Shared test helpers: in-memory collaborators and engine harness.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::Config;
use crate::engine::BatchEngine;
use crate::error::{Error, Result};
use crate::metadata::{MetadataReader, NoOpMetadataReader, TorrentMetadata};
use crate::sink::FileSink;
use crate::transport::{ChatTransport, PromptButton};
use crate::types::{
    ChatId, ClassificationEvent, FileRef, InboundFile, MessageId, UserId,
};

/// Chat admins used across engine tests
pub(crate) const OWNER: UserId = UserId(10);
pub(crate) const OTHER_ADMIN: UserId = UserId(11);
pub(crate) const OUTSIDER: UserId = UserId(99);
pub(crate) const CHAT: ChatId = ChatId(100);

/// One message recorded by the [`RecordingTransport`]
#[derive(Clone, Debug)]
pub(crate) enum Outbound {
    Message {
        chat: ChatId,
        id: MessageId,
        text: String,
    },
    Prompt {
        chat: ChatId,
        id: MessageId,
        text: String,
        keyboard: Vec<PromptButton>,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
        keyboard: Vec<PromptButton>,
    },
}

/// Transport that records every outbound message instead of sending it
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    next_id: AtomicI64,
    pub(crate) fail_sends: AtomicBool,
    pub(crate) sent: Mutex<Vec<Outbound>>,
}

impl RecordingTransport {
    fn allocate(&self) -> MessageId {
        MessageId(1000 + self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::Transport("injected send failure".to_string()));
        }
        Ok(())
    }

    pub(crate) fn prompts(&self) -> Vec<(MessageId, String, Vec<PromptButton>)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                Outbound::Prompt {
                    id, text, keyboard, ..
                } => Some((*id, text.clone(), keyboard.clone())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                Outbound::Message { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn edits(&self) -> Vec<(MessageId, String, usize)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                Outbound::Edit {
                    message,
                    text,
                    keyboard,
                    ..
                } => Some((*message, text.clone(), keyboard.len())),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId> {
        self.check_failure()?;
        let id = self.allocate();
        self.sent.lock().unwrap().push(Outbound::Message {
            chat,
            id,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn send_prompt(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &[PromptButton],
    ) -> Result<MessageId> {
        self.check_failure()?;
        let id = self.allocate();
        self.sent.lock().unwrap().push(Outbound::Prompt {
            chat,
            id,
            text: text.to_string(),
            keyboard: keyboard.to_vec(),
        });
        Ok(id)
    }

    async fn edit_prompt(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &[PromptButton],
    ) -> Result<()> {
        self.check_failure()?;
        self.sent.lock().unwrap().push(Outbound::Edit {
            chat,
            message,
            text: text.to_string(),
            keyboard: keyboard.to_vec(),
        });
        Ok(())
    }
}

/// Sink that writes a synthetic payload derived from the file handle
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    pub(crate) downloads: AtomicUsize,
    pub(crate) fail_names: Mutex<HashSet<String>>,
}

impl MemorySink {
    pub(crate) fn fail_for(&self, name: &str) {
        self.fail_names.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSink for MemorySink {
    async fn download(&self, file: &FileRef, dest: &Path) -> Result<()> {
        if self.fail_names.lock().unwrap().contains(&file.name) {
            return Err(Error::Download {
                name: file.name.clone(),
                reason: "injected download failure".to_string(),
            });
        }
        self.downloads.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(dest, format!("payload:{}", file.handle)).await?;
        Ok(())
    }
}

/// Metadata reader returning a fixed result
#[derive(Clone, Debug)]
pub(crate) struct StaticMetadataReader(pub(crate) TorrentMetadata);

impl MetadataReader for StaticMetadataReader {
    fn parse(&self, _bytes: &[u8]) -> Result<TorrentMetadata> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Engine plus its recording collaborators and backing temp dir
pub(crate) struct Harness {
    pub(crate) engine: Arc<BatchEngine>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) sink: Arc<MemorySink>,
    pub(crate) temp: TempDir,
}

impl Harness {
    /// Destination directory for the movies bucket
    pub(crate) fn movies_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("torrents").join("Movies")
    }
}

pub(crate) fn test_config(temp: &TempDir) -> Config {
    let mut config = Config {
        admin_ids: vec![OWNER, OTHER_ADMIN],
        ..Default::default()
    };
    config.library.root_dir = temp.path().join("torrents");
    config.batch.debounce = Duration::from_secs(1);
    config.batch.ttl = Duration::from_secs(3600);
    config.notify.health_trigger_path = temp.path().join("triggers").join("health.run");
    config
}

pub(crate) fn harness() -> Harness {
    harness_with_reader(Arc::new(NoOpMetadataReader))
}

pub(crate) fn harness_with_metadata(metadata: TorrentMetadata) -> Harness {
    harness_with_reader(Arc::new(StaticMetadataReader(metadata)))
}

fn harness_with_reader(reader: Arc<dyn MetadataReader>) -> Harness {
    let temp = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let sink = Arc::new(MemorySink::default());
    let engine = Arc::new(
        BatchEngine::new(
            test_config(&temp),
            transport.clone(),
            sink.clone(),
            reader,
        )
        .unwrap(),
    );
    Harness {
        engine,
        transport,
        sink,
        temp,
    }
}

/// Inbound file event from the batch owner
pub(crate) fn doc(name: &str, media_group: Option<&str>, message_id: i64) -> InboundFile {
    doc_from(OWNER, name, media_group, message_id)
}

pub(crate) fn doc_from(
    user: UserId,
    name: &str,
    media_group: Option<&str>,
    message_id: i64,
) -> InboundFile {
    InboundFile {
        chat: CHAT,
        user,
        message_id: MessageId(message_id),
        media_group_id: media_group.map(|s| s.to_string()),
        document: FileRef {
            handle: format!("handle-{message_id}"),
            name: name.to_string(),
        },
    }
}

/// Classification event carrying a pre-encoded token
pub(crate) fn action(user: UserId, message_id: i64, data: &str) -> ClassificationEvent {
    ClassificationEvent {
        chat: CHAT,
        user,
        message_id: MessageId(message_id),
        data: data.to_string(),
    }
}

/// Let spawned debounce tasks run to completion under paused time
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
