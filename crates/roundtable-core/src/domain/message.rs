//! Transcript entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// The opening message passed to `Orchestrator::start`.
    Seed,
    /// Ordinary participant output.
    Text,
    /// Report of a code execution (successful or not).
    Execution,
    /// A production failure recorded after the retry budget ran out.
    Error,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageKind::Seed => "seed",
            MessageKind::Text => "text",
            MessageKind::Execution => "execution",
            MessageKind::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A single entry in the shared transcript.
///
/// `seq` is assigned by the transcript on append and always equals the
/// entry's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub seq: u64,
    /// Name of the participant that authored the entry.
    pub author: String,
    pub kind: MessageKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_display() {
        assert_eq!(MessageKind::Seed.to_string(), "seed");
        assert_eq!(MessageKind::Text.to_string(), "text");
        assert_eq!(MessageKind::Execution.to_string(), "execution");
        assert_eq!(MessageKind::Error.to_string(), "error");
    }

    #[test]
    fn test_message_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MessageKind::Execution).unwrap();
        assert_eq!(json, "\"execution\"");
    }
}
