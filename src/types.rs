//! Core types for torrent-inbox

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::metadata::TorrentMetadata;

/// Identifier of a chat/conversation on the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Identifier of a user on the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identifier of a message within a chat
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable key correlating file arrivals into one batch
///
/// Two uploads land in the same batch iff they share a transport media
/// group id within the same chat. A lone upload gets a key derived from
/// its own message id, so it forms a batch of one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Key for a transport-grouped (album) upload
    pub fn media_group(chat: ChatId, media_group_id: &str) -> Self {
        Self(format!("mg:{}:{}", chat.0, media_group_id))
    }

    /// Key for a lone upload, keyed by its message id
    pub fn single(chat: ChatId, message: MessageId) -> Self {
        Self(format!("msg:{}:{}", chat.0, message.0))
    }

    /// Derive the key for an inbound file event
    pub fn for_file(file: &InboundFile) -> Self {
        match &file.media_group_id {
            Some(id) => Self::media_group(file.chat, id),
            None => Self::single(file.chat, file.message_id),
        }
    }

    /// The raw key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Transport-owned reference to an uploaded file
///
/// The `handle` is opaque to the engine; only the [`crate::sink::FileSink`]
/// knows how to turn it into bytes on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRef {
    /// Opaque transport handle used to fetch the file contents
    pub handle: String,
    /// Declared file name as sent by the user (untrusted)
    pub name: String,
}

/// Inbound document event delivered by the transport
#[derive(Clone, Debug)]
pub struct InboundFile {
    /// Chat the file was sent to
    pub chat: ChatId,
    /// User who sent the file
    pub user: UserId,
    /// Message carrying the file
    pub message_id: MessageId,
    /// Transport grouping id for album uploads, if any
    pub media_group_id: Option<String>,
    /// The file itself
    pub document: FileRef,
}

/// Inbound classification (button press) event delivered by the transport
#[derive(Clone, Debug)]
pub struct ClassificationEvent {
    /// Chat the prompt lives in
    pub chat: ChatId,
    /// User who pressed the button
    pub user: UserId,
    /// The prompt message the button was attached to
    pub message_id: MessageId,
    /// Raw callback token, decoded via [`ActionToken::decode`]
    pub data: String,
}

/// Destination bucket for a batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Film bucket
    Movies,
    /// Episodic bucket
    Series,
}

impl Classification {
    /// Token wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Movies => "movies",
            Classification::Series => "series",
        }
    }

    /// Human-facing bucket label
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Movies => "Movies",
            Classification::Series => "Series",
        }
    }
}

/// Action requested against a pending batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchAction {
    /// Save the batch into the given bucket
    Classify(Classification),
    /// Discard the batch without saving anything
    Cancel,
}

/// Callback token prefix shared by encode and decode
const TOKEN_PREFIX: &str = "cls|";

/// Typed form of the compact callback token attached to prompt buttons
///
/// Wire format: `cls|{group_key}|{action}`. The action is split off the
/// *end* of the token so group keys that themselves contain the separator
/// (a transport media group id is an opaque string) still round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionToken {
    /// Batch the action targets
    pub group_key: GroupKey,
    /// What to do with it
    pub action: BatchAction,
}

impl ActionToken {
    /// Build a token for a batch/action pair
    pub fn new(group_key: GroupKey, action: BatchAction) -> Self {
        Self { group_key, action }
    }

    /// Encode to the compact wire form
    pub fn encode(&self) -> String {
        let action = match self.action {
            BatchAction::Classify(class) => class.as_str(),
            BatchAction::Cancel => "cancel",
        };
        format!("{}{}|{}", TOKEN_PREFIX, self.group_key, action)
    }

    /// Decode from the compact wire form
    ///
    /// # Errors
    /// Returns [`Error::MalformedToken`] when the prefix, separator, or
    /// action name does not match.
    pub fn decode(data: &str) -> crate::Result<Self> {
        let rest = data
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| Error::MalformedToken(data.to_string()))?;
        let (key, action) = rest
            .rsplit_once('|')
            .ok_or_else(|| Error::MalformedToken(data.to_string()))?;
        let action = match action {
            "movies" => BatchAction::Classify(Classification::Movies),
            "series" => BatchAction::Classify(Classification::Series),
            "cancel" => BatchAction::Cancel,
            _ => return Err(Error::MalformedToken(data.to_string())),
        };
        Ok(Self {
            group_key: GroupKey::from(key),
            action,
        })
    }
}

/// Result of handling one inbound document event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Sender is not an admin; dropped silently
    Ignored,
    /// File rejected (not a `.torrent`); sender was told
    Unsupported,
    /// File accepted into a batch
    Accepted {
        /// Batch the file joined
        group_key: GroupKey,
        /// File count of the batch after this arrival
        files: usize,
    },
}

/// Result of handling one classification event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Sender is not an admin; dropped silently
    Ignored,
    /// No pending batch for the key (expired or already processed)
    Missing,
    /// Sender is not the batch owner; batch left pending
    NotOwner,
    /// Batch discarded without saving anything
    Cancelled,
    /// Batch saved/skipped per file
    Classified(Summary),
}

/// Per-file accounting of a resolved batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Chosen bucket
    pub classification: Classification,
    /// Directory the batch was saved into
    pub dest_dir: PathBuf,
    /// Files written to disk, in arrival order
    pub saved: Vec<String>,
    /// Files skipped as duplicates (within the batch or already on disk)
    pub skipped: Vec<String>,
    /// Files that failed (empty name or download failure)
    pub errors: Vec<String>,
    /// Torrent metadata for single-file batches, when the reader succeeds
    pub metadata: Option<TorrentMetadata>,
}

/// Engine lifecycle and batch events, broadcast to subscribers
///
/// Purely observational; no consumer is required for correct operation.
#[derive(Clone, Debug)]
pub enum Event {
    /// A new batch was created for a group key
    BatchCreated {
        /// Key of the new batch
        group_key: GroupKey,
        /// Chat the batch belongs to
        chat: ChatId,
    },
    /// A file joined an existing batch
    FileAdded {
        /// Key of the batch
        group_key: GroupKey,
        /// File count after the append
        files: usize,
    },
    /// The debounced prompt was sent
    PromptSent {
        /// Key of the batch
        group_key: GroupKey,
        /// File count shown in the prompt
        files: usize,
    },
    /// A batch aged out and was silently discarded
    BatchExpired {
        /// Key of the expired batch
        group_key: GroupKey,
    },
    /// A batch was cancelled by its owner
    BatchCancelled {
        /// Key of the cancelled batch
        group_key: GroupKey,
    },
    /// A batch was classified and processed
    BatchResolved {
        /// Key of the resolved batch
        group_key: GroupKey,
        /// Chosen bucket
        classification: Classification,
        /// Number of files written
        saved: usize,
        /// Number of files skipped as duplicates
        skipped: usize,
        /// Number of files that errored
        errors: usize,
    },
}
