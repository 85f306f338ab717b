//! Confirmation requests and human decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Message;
use crate::sandbox::CodeBlock;

/// What a participant asks a human before acting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub request_id: Uuid,
    /// Participant that is blocked on this request.
    pub participant: String,
    pub prompt: String,
    /// Code the participant will run if the human approves.
    pub pending_code: Vec<CodeBlock>,
    /// Latest message visible to the participant, if any.
    pub latest_message: Option<Message>,
    pub created_at: DateTime<Utc>,
}

impl ConfirmationRequest {
    pub fn new(
        participant: impl Into<String>,
        prompt: impl Into<String>,
        pending_code: Vec<CodeBlock>,
        latest_message: Option<Message>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            participant: participant.into(),
            prompt: prompt.into(),
            pending_code,
            latest_message,
            created_at: Utc::now(),
        }
    }

    pub fn has_pending_code(&self) -> bool {
        !self.pending_code.is_empty()
    }
}

/// The human's answer to a [`ConfirmationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ConfirmationDecision {
    /// Go ahead with the automatic reply (run pending code, if any).
    Approve,
    /// Send this text instead of the automatic reply.
    Reply { text: String },
    /// Skip the pending action; the reason is posted to the chat.
    Reject { reason: String },
    /// Stop participating; ends the session.
    Abort { reason: String },
}

impl ConfirmationDecision {
    /// Whether this decision ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Abort { .. })
    }

    /// Parse a line of console input.
    ///
    /// Empty input approves, `exit`/`abort` aborts, `reject[: reason]` rejects,
    /// anything else is sent as a reply.
    pub fn from_console_line(line: &str) -> Self {
        let trimmed = line.trim();
        let lower = trimmed.to_ascii_lowercase();
        if trimmed.is_empty() {
            Self::Approve
        } else if lower == "exit" || lower == "abort" {
            Self::Abort {
                reason: "operator exited".into(),
            }
        } else if lower == "reject" || lower.starts_with("reject:") {
            let reason = trimmed
                .split_once(':')
                .map(|(_, r)| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "rejected by operator".into());
            Self::Reject { reason }
        } else {
            Self::Reply {
                text: trimmed.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_line_parsing() {
        assert_eq!(
            ConfirmationDecision::from_console_line(""),
            ConfirmationDecision::Approve
        );
        assert_eq!(
            ConfirmationDecision::from_console_line("  \n"),
            ConfirmationDecision::Approve
        );
        assert!(ConfirmationDecision::from_console_line("exit").is_terminal());
        assert!(ConfirmationDecision::from_console_line("ABORT").is_terminal());
        assert_eq!(
            ConfirmationDecision::from_console_line("reject: unsafe rm"),
            ConfirmationDecision::Reject {
                reason: "unsafe rm".into()
            }
        );
        assert_eq!(
            ConfirmationDecision::from_console_line("reject"),
            ConfirmationDecision::Reject {
                reason: "rejected by operator".into()
            }
        );
        assert_eq!(
            ConfirmationDecision::from_console_line("please add logging"),
            ConfirmationDecision::Reply {
                text: "please add logging".into()
            }
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let d = ConfirmationDecision::Reject {
            reason: "no".into(),
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"decision\":\"reject\""));
        let back: ConfirmationDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }

    #[test]
    fn test_request_has_pending_code() {
        let req = ConfirmationRequest::new("Runner", "continue?", vec![], None);
        assert!(!req.has_pending_code());
        let req = ConfirmationRequest::new(
            "Runner",
            "run?",
            vec![CodeBlock::new(Some("sh"), "echo hi\n")],
            None,
        );
        assert!(req.has_pending_code());
    }
}
