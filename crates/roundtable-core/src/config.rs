//! Session and participant configuration.
//!
//! Loaded from TOML or JSON (chosen by file extension) and validated before a
//! roster is built. Every field except the roster and seed has a default, so a
//! minimal session file only lists participants and the opening message.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Result, RoundtableError};
use crate::roles::Role;
use crate::termination::{TerminationMatcher, DEFAULT_TERMINATION_PATTERN};

fn default_exec_timeout_secs() -> u64 {
    120
}

fn default_round_ceiling() -> u32 {
    150
}

fn default_production_timeout_secs() -> u64 {
    1200
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_max_consecutive_failed_turns() -> u32 {
    3
}

fn default_termination_pattern() -> String {
    DEFAULT_TERMINATION_PATTERN.to_string()
}

/// Static configuration of one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    pub name: String,
    pub role: Role,
    /// Human-readable behaviour text; falls back to the role's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Directory code is saved to and run from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    /// Per-block execution timeout.
    #[serde(default = "default_exec_timeout_secs")]
    pub timeout_secs: u64,
    /// How many recent messages the participant sees; `None` = whole transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_window: Option<usize>,
    #[serde(default)]
    pub human_confirmation: bool,
    #[serde(default)]
    pub execution_enabled: bool,
}

impl ParticipantConfig {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            description: None,
            working_directory: None,
            timeout_secs: default_exec_timeout_secs(),
            message_window: None,
            human_confirmation: false,
            execution_enabled: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.message_window = Some(window);
        self
    }

    /// Enable code execution in `working_directory`.
    pub fn with_execution(mut self, working_directory: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        self.execution_enabled = true;
        self.working_directory = Some(working_directory.into());
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_human_confirmation(mut self) -> Self {
        self.human_confirmation = true;
        self
    }

    /// Description text, or the role default when none was configured.
    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.role.default_description())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RoundtableError::InvalidConfig(
                "participant name must not be empty".into(),
            ));
        }
        if self.execution_enabled {
            if !self.role.may_execute() {
                return Err(RoundtableError::InvalidConfig(format!(
                    "participant {} has role {} which may not execute code",
                    self.name, self.role
                )));
            }
            if self.working_directory.is_none() {
                return Err(RoundtableError::InvalidConfig(format!(
                    "participant {} enables execution without a working_directory",
                    self.name
                )));
            }
            if self.timeout_secs == 0 {
                return Err(RoundtableError::InvalidConfig(format!(
                    "participant {} has a zero execution timeout",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Which speaker-selection policy to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SelectionConfig {
    #[default]
    RoundRobin,
    /// Cycle an explicit ordered list of participant names.
    Fixed { order: Vec<String> },
    /// Follow name mentions in the latest message, else round robin.
    Mention,
}

impl SelectionConfig {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionConfig::RoundRobin => "round_robin",
            SelectionConfig::Fixed { .. } => "fixed",
            SelectionConfig::Mention => "mention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationConfig {
    /// Regex matched against text messages.
    #[serde(default = "default_termination_pattern")]
    pub pattern: String,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            pattern: default_termination_pattern(),
        }
    }
}

/// What to do once a turn's retry budget is spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedAction {
    /// End the session with a failure status.
    #[default]
    EndSession,
    /// Record the failure and move on to the next speaker.
    Advance,
}

/// Retry and failure handling for participant production calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Retries on the same participant after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts (milliseconds).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default)]
    pub on_exhausted: ExhaustedAction,
    /// With `advance`, this many failed turns in a row fail the session.
    #[serde(default = "default_max_consecutive_failed_turns")]
    pub max_consecutive_failed_turns: u32,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            on_exhausted: ExhaustedAction::default(),
            max_consecutive_failed_turns: default_max_consecutive_failed_turns(),
        }
    }
}

/// Shared model parameters for LLM-backed participants.
///
/// Immutable once loaded; participants receive it by `Arc` at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Acceptable model names, in preference order.
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_production_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Complete description of one group-chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_round_ceiling")]
    pub round_ceiling: u32,
    pub seed_message: String,
    pub seed_author: String,
    /// Upper bound on one production call, retries excluded.
    #[serde(default = "default_production_timeout_secs")]
    pub production_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_clock_limit_secs: Option<u64>,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub termination: TerminationConfig,
    #[serde(default)]
    pub failure: FailurePolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelProfile>,
    pub participants: Vec<ParticipantConfig>,
}

impl SessionConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load from a `.toml` or `.json` file and validate.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&raw)?,
            Some("toml") => Self::from_toml_str(&raw)?,
            other => {
                return Err(RoundtableError::InvalidConfig(format!(
                    "unsupported config extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RoundtableError::InvalidConfig(format!("serialize config: {e}")))
    }

    pub fn participant(&self, name: &str) -> Option<&ParticipantConfig> {
        self.participants.iter().find(|p| p.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.participants.is_empty() {
            return Err(RoundtableError::EmptyRoster);
        }
        if self.round_ceiling == 0 {
            return Err(RoundtableError::InvalidConfig(
                "round_ceiling must be positive".into(),
            ));
        }
        if self.production_timeout_secs == 0 {
            return Err(RoundtableError::InvalidConfig(
                "production_timeout_secs must be positive".into(),
            ));
        }

        let mut seen = HashSet::new();
        for p in &self.participants {
            p.validate()?;
            if !seen.insert(p.name.as_str()) {
                return Err(RoundtableError::DuplicateParticipant(p.name.clone()));
            }
        }

        if !seen.contains(self.seed_author.as_str()) {
            return Err(RoundtableError::UnknownParticipant(self.seed_author.clone()));
        }

        if let SelectionConfig::Fixed { order } = &self.selection {
            if order.is_empty() {
                return Err(RoundtableError::InvalidConfig(
                    "fixed selection order must not be empty".into(),
                ));
            }
            if let Some(unknown) = order.iter().find(|n| !seen.contains(n.as_str())) {
                return Err(RoundtableError::UnknownParticipant(unknown.clone()));
            }
        }

        TerminationMatcher::new(&self.termination.pattern)?;
        Ok(())
    }
}
