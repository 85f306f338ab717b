//! Session lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a session stands. Every variant except `Running` is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    /// A message matched the termination pattern.
    Terminated { by: String },
    /// An interactive participant ended the session without speaking.
    Declined { by: String, reason: String },
    RoundLimitReached { rounds: u32 },
    Cancelled,
    DeadlineExceeded { limit_secs: u64 },
    /// Retries were exhausted or speaker selection broke down.
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participant: Option<String>,
        reason: String,
    },
}

impl SessionStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SessionStatus::Failed { .. })
    }

    /// Ended for a reason other than the conversation reaching a natural stop.
    pub fn is_abnormal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Failed { .. }
                | SessionStatus::Cancelled
                | SessionStatus::DeadlineExceeded { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Terminated { .. } => "terminated",
            SessionStatus::Declined { .. } => "declined",
            SessionStatus::RoundLimitReached { .. } => "round_limit_reached",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::DeadlineExceeded { .. } => "deadline_exceeded",
            SessionStatus::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Terminated { by } => write!(f, "terminated by {by}"),
            SessionStatus::Declined { by, reason } => write!(f, "declined by {by}: {reason}"),
            SessionStatus::RoundLimitReached { rounds } => {
                write!(f, "round limit reached after {rounds} rounds")
            }
            SessionStatus::Cancelled => write!(f, "cancelled"),
            SessionStatus::DeadlineExceeded { limit_secs } => {
                write!(f, "wall-clock limit of {limit_secs}s exceeded")
            }
            SessionStatus::Failed {
                participant: Some(p),
                reason,
            } => write!(f, "failed at {p}: {reason}"),
            SessionStatus::Failed {
                participant: None,
                reason,
            } => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(!SessionStatus::Running.is_finished());
        assert!(SessionStatus::Cancelled.is_finished());
        assert!(SessionStatus::Cancelled.is_abnormal());
        assert!(!SessionStatus::RoundLimitReached { rounds: 5 }.is_abnormal());
        let failed = SessionStatus::Failed {
            participant: Some("Programmer".into()),
            reason: "boom".into(),
        };
        assert!(failed.is_failure());
        assert_eq!(failed.label(), "failed");
        assert_eq!(failed.to_string(), "failed at Programmer: boom");
    }

    #[test]
    fn test_status_serde_tag() {
        let s = SessionStatus::Terminated {
            by: "Tester".into(),
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["status"], "terminated");
        assert_eq!(json["by"], "Tester");
        let back: SessionStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
