//! Human-in-the-loop confirmation.
//!
//! A participant configured with human confirmation suspends on an injected
//! [`ConfirmationChannel`] before it acts. Keeping the channel injectable means
//! the orchestrator never reads a terminal directly and can be driven from
//! tests, a UI task, or the console adapter in the CLI.

pub mod channel;
pub mod error;
pub mod request;

pub use channel::{
    AutoApprove, ConfirmationChannel, PendingConfirmation, QueueConfirmation,
    ScriptedConfirmation,
};
pub use error::{HitlError, HitlResult};
pub use request::{ConfirmationDecision, ConfirmationRequest};
