//! Roundtable domain model: messages, transcript, and the error taxonomy.

pub mod error;
pub mod message;
pub mod transcript;

pub use error::{Result, RoundtableError};
pub use message::{Message, MessageKind};
pub use transcript::{digest_messages, Transcript};
