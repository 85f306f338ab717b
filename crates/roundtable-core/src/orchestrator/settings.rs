//! Orchestrator runtime settings.

use std::time::Duration;

use crate::config::{FailurePolicy, SessionConfig};
use crate::domain::{Result, RoundtableError};
use crate::termination::DEFAULT_TERMINATION_PATTERN;

/// Limits and policies that govern one orchestrator run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub round_ceiling: u32,
    /// Bound on one `produce` attempt.
    pub production_timeout: Duration,
    pub wall_clock_limit: Option<Duration>,
    pub failure: FailurePolicy,
    pub termination_pattern: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            round_ceiling: 150,
            production_timeout: Duration::from_secs(1200),
            wall_clock_limit: None,
            failure: FailurePolicy::default(),
            termination_pattern: DEFAULT_TERMINATION_PATTERN.to_string(),
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            round_ceiling: config.round_ceiling,
            production_timeout: Duration::from_secs(config.production_timeout_secs),
            wall_clock_limit: config.wall_clock_limit_secs.map(Duration::from_secs),
            failure: config.failure.clone(),
            termination_pattern: config.termination.pattern.clone(),
        }
    }

    pub fn with_round_ceiling(mut self, ceiling: u32) -> Self {
        self.round_ceiling = ceiling;
        self
    }

    pub fn with_production_timeout(mut self, timeout: Duration) -> Self {
        self.production_timeout = timeout;
        self
    }

    pub fn with_wall_clock_limit(mut self, limit: Duration) -> Self {
        self.wall_clock_limit = Some(limit);
        self
    }

    pub fn with_failure_policy(mut self, failure: FailurePolicy) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_termination_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.termination_pattern = pattern.into();
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.failure.backoff_base_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<()> {
        if self.round_ceiling == 0 {
            return Err(RoundtableError::InvalidConfig(
                "round_ceiling must be positive".into(),
            ));
        }
        if self.production_timeout.is_zero() {
            return Err(RoundtableError::InvalidConfig(
                "production timeout must be positive".into(),
            ));
        }
        if self.failure.max_consecutive_failed_turns == 0 {
            return Err(RoundtableError::InvalidConfig(
                "max_consecutive_failed_turns must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session_defaults() {
        let s = OrchestratorSettings::default();
        assert_eq!(s.round_ceiling, 150);
        assert_eq!(s.production_timeout, Duration::from_secs(1200));
        assert_eq!(s.failure.max_retries, 1);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_backoff_is_exponential() {
        let s = OrchestratorSettings::default();
        assert_eq!(s.backoff(1), Duration::from_millis(250));
        assert_eq!(s.backoff(2), Duration::from_millis(500));
        assert_eq!(s.backoff(3), Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let s = OrchestratorSettings::default().with_round_ceiling(0);
        assert!(matches!(s.validate(), Err(RoundtableError::InvalidConfig(_))));
    }
}
