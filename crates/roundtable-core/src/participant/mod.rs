//! Participants: the actors that take turns in a session.
//!
//! The orchestrator only depends on the [`Participant`] trait. Two
//! implementations ship with the crate:
//!
//! - [`scripted::ScriptedParticipant`] — replays canned steps; stands in for
//!   LLM-backed assistants in tests and offline runs.
//! - [`proxy::ProxyParticipant`] — user-proxy style; runs code from the
//!   transcript in a working directory and/or asks a human first.

pub mod error;
pub mod proxy;
pub mod scripted;

use async_trait::async_trait;

use crate::config::ParticipantConfig;
use crate::domain::Message;
use crate::sandbox::ExecutionOutcome;

pub use error::{ParticipantError, ParticipantResult};
pub use proxy::ProxyParticipant;
pub use scripted::{ScriptStep, ScriptedParticipant};

/// What a participant hands back for its turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Ordinary chat message.
    Text(String),
    /// Rendered execution report plus the raw outcomes behind it.
    Execution {
        report: String,
        outcomes: Vec<ExecutionOutcome>,
    },
    /// The participant will not continue; the session ends without a new message.
    Decline { reason: String },
}

/// An actor in the group chat.
#[async_trait]
pub trait Participant: Send + Sync {
    fn config(&self) -> &ParticipantConfig;

    fn name(&self) -> &str {
        &self.config().name
    }

    /// Produce this participant's next message.
    ///
    /// `window` is the tail of the transcript sized by the participant's
    /// `message_window`.
    async fn produce(&self, window: &[Message]) -> ParticipantResult<Reply>;

    /// Whether `produce` may wait on a human. Interactive turns are not
    /// bounded by the production timeout.
    fn is_interactive(&self) -> bool {
        self.config().human_confirmation
    }
}
