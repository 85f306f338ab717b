//! Termination-marker detection.

use regex::Regex;

use crate::domain::{Result, RoundtableError};

/// Default marker: `TERMINATE` as the last word of a message.
pub const DEFAULT_TERMINATION_PATTERN: &str = r"\bTERMINATE\s*$";

/// Recognizes a participant's request to end the session.
#[derive(Debug, Clone)]
pub struct TerminationMatcher {
    regex: Regex,
}

impl TerminationMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            RoundtableError::InvalidConfig(format!("invalid termination pattern {pattern:?}: {e}"))
        })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for TerminationMatcher {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_TERMINATION_PATTERN).expect("default pattern is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_trailing_marker() {
        let m = TerminationMatcher::default();
        assert!(m.is_match("TERMINATE"));
        assert!(m.is_match("All tests pass. TERMINATE"));
        assert!(m.is_match("done\nTERMINATE\n"));
    }

    #[test]
    fn test_default_ignores_marker_mid_message() {
        let m = TerminationMatcher::default();
        assert!(!m.is_match("Do not TERMINATE yet, still failing"));
        assert!(!m.is_match("NOTERMINATE"));
        assert!(!m.is_match("keep going"));
    }

    #[test]
    fn test_custom_pattern() {
        let m = TerminationMatcher::new(r"(?i)^\s*stop\s*$").unwrap();
        assert!(m.is_match(" Stop "));
        assert!(!m.is_match("don't stop"));
        assert_eq!(m.pattern(), r"(?i)^\s*stop\s*$");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = TerminationMatcher::new("(unclosed").unwrap_err();
        assert!(matches!(err, RoundtableError::InvalidConfig(_)));
    }
}
