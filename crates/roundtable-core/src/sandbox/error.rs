//! Error types for the sandbox module.

/// Errors produced by the sandbox layer.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("path {path} escapes working directory {root}")]
    PathEscape { path: String, root: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("invalid sandbox configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    /// Whether the error came from the working-directory boundary check.
    pub fn is_boundary_violation(&self) -> bool {
        matches!(self, Self::PathEscape { .. } | Self::InvalidPath(_))
    }
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
