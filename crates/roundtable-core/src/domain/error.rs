//! Domain-level error taxonomy for Roundtable.

/// Roundtable domain errors.
#[derive(Debug, thiserror::Error)]
pub enum RoundtableError {
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("roster must contain at least one participant")]
    EmptyRoster,

    #[error("duplicate participant name: {0}")]
    DuplicateParticipant(String),

    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("session {0} has already been started")]
    AlreadyStarted(uuid::Uuid),

    #[error("session {0} has not been seeded")]
    NotStarted(uuid::Uuid),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Roundtable domain operations.
pub type Result<T> = std::result::Result<T, RoundtableError>;
