//! Error types for the human confirmation layer.

/// Errors produced while waiting on a human decision.
#[derive(Debug, thiserror::Error)]
pub enum HitlError {
    #[error("confirmation request expired after {timeout_secs}s")]
    Expired { timeout_secs: u64 },

    #[error("confirmation channel closed")]
    ChannelClosed,

    #[error("no scripted decision left for {participant}")]
    Exhausted { participant: String },

    #[error("console io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for confirmation operations.
pub type HitlResult<T> = std::result::Result<T, HitlError>;
