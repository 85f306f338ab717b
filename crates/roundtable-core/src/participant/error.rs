//! Error types for participant turns.

use crate::hitl::HitlError;
use crate::sandbox::SandboxError;

/// Errors produced while a participant takes its turn.
#[derive(Debug, thiserror::Error)]
pub enum ParticipantError {
    #[error("{participant} failed to produce a message: {reason}")]
    Production { participant: String, reason: String },

    #[error("{participant} did not respond within {limit_secs}s")]
    Timeout { participant: String, limit_secs: u64 },

    #[error("execution failed: {0}")]
    Execution(#[from] SandboxError),

    #[error("confirmation failed: {0}")]
    Confirmation(#[from] HitlError),

    #[error("participant {participant} is misconfigured: {reason}")]
    Misconfigured { participant: String, reason: String },
}

impl ParticipantError {
    /// Whether the orchestrator should retry the turn on the same participant.
    ///
    /// Execution errors are reported to the chat instead, and configuration
    /// errors will not fix themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Production { .. } | Self::Timeout { .. } | Self::Confirmation(_)
        )
    }
}

/// Result type for participant operations.
pub type ParticipantResult<T> = std::result::Result<T, ParticipantError>;
