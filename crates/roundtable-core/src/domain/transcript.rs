//! Shared, append-only transcript.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::error::Result;
use super::message::{Message, MessageKind};

/// Ordered log of every message in a session.
///
/// Entries can only be appended; there is no API to remove, reorder or edit
/// them. Each appended message receives `seq == len()` at the time of append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a reference to the stored entry.
    pub fn append(
        &mut self,
        author: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> &Message {
        let seq = self.messages.len() as u64;
        self.messages.push(Message {
            seq,
            author: author.into(),
            kind,
            content: content.into(),
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent `window` messages, or the whole transcript for `None`.
    pub fn tail(&self, window: Option<usize>) -> &[Message] {
        match window {
            Some(n) if n < self.messages.len() => &self.messages[self.messages.len() - n..],
            _ => &self.messages,
        }
    }

    /// Number of entries of the given kind.
    pub fn count_kind(&self, kind: MessageKind) -> usize {
        self.messages.iter().filter(|m| m.kind == kind).count()
    }

    /// SHA-256 hex digest of `serde_json::to_vec(messages)`.
    pub fn digest(&self) -> Result<String> {
        digest_messages(&self.messages)
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// SHA-256 hex digest over a serialized message list.
pub fn digest_messages(messages: &[Message]) -> Result<String> {
    let bytes = serde_json::to_vec(messages)?;
    Ok(hex::encode(sha2::Sha256::digest(&bytes)))
}
