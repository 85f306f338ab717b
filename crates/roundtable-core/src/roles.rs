//! Role vocabulary for group-chat participants.
//!
//! A role is typed behaviour metadata. The free-text description attached to a
//! participant is carried for humans and downstream prompts only; nothing in
//! the orchestrator branches on it.

use serde::{Deserialize, Serialize};

/// The role archetypes in a design/implement/test group chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Human-facing proxy that runs the application and gives feedback.
    Runner,
    Designer,
    Programmer,
    Tester,
    /// Runs code produced by other participants.
    Executor,
    Custom(String),
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Runner => write!(f, "runner"),
            Role::Designer => write!(f, "designer"),
            Role::Programmer => write!(f, "programmer"),
            Role::Tester => write!(f, "tester"),
            Role::Executor => write!(f, "executor"),
            Role::Custom(s) => write!(f, "custom({s})"),
        }
    }
}

impl Role {
    /// Whether a participant with this role may be given an execution capability.
    ///
    /// | Role       | Execute |
    /// |------------|---------|
    /// | Runner     |    ✓    |
    /// | Designer   |    ✗    |
    /// | Programmer |    ✗    |
    /// | Tester     |    ✓    |
    /// | Executor   |    ✓    |
    /// | Custom     |    ✓    |
    pub fn may_execute(&self) -> bool {
        !matches!(self, Role::Designer | Role::Programmer)
    }

    /// Short description used when a participant config omits one.
    pub fn default_description(&self) -> String {
        match self {
            Role::Runner => "Provides feedback on running the application".to_string(),
            Role::Designer => "Designs the application and documents the design".to_string(),
            Role::Programmer => "Codes the application in the working directory".to_string(),
            Role::Tester => "Tests the application and reports bugs".to_string(),
            Role::Executor => "Executes code and reports outcomes".to_string(),
            Role::Custom(name) => format!("Custom role: {name}"),
        }
    }
}
