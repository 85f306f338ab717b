//! Speaker selection policies.
//!
//! The orchestrator asks a [`SpeakerSelector`] for a roster index before every
//! round. Policies are swappable at construction; [`build_selector`] maps the
//! serializable [`SelectionConfig`] onto the built-in ones.

use async_trait::async_trait;
use tracing::warn;

use crate::config::{ParticipantConfig, SelectionConfig};
use crate::domain::Transcript;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("cannot select a speaker from an empty roster")]
    EmptyRoster,

    #[error("fixed speaking order is empty")]
    EmptySequence,

    #[error("selected index {index} is out of range for roster of {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("selected participant is not on the roster: {0}")]
    UnknownParticipant(String),

    #[error("manager failed to choose a speaker: {0}")]
    Manager(String),
}

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

/// Everything a selector may look at when choosing the next speaker.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Rounds completed so far (0 before the first step).
    pub round: u32,
    pub roster: &'a [ParticipantConfig],
    pub transcript: &'a Transcript,
    /// Roster index of the previous round's speaker.
    pub last_speaker: Option<usize>,
}

impl SelectionContext<'_> {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.roster.iter().position(|p| p.name == name)
    }

    fn round_robin_index(&self) -> SelectionResult<usize> {
        if self.roster.is_empty() {
            return Err(SelectionError::EmptyRoster);
        }
        Ok(self.round as usize % self.roster.len())
    }
}

/// Chooses who speaks next.
#[async_trait]
pub trait SpeakerSelector: Send + Sync {
    /// Return the roster index of the next speaker.
    async fn select(&self, ctx: &SelectionContext<'_>) -> SelectionResult<usize>;

    fn name(&self) -> &str;
}

/// Cycles the roster from its head: round `r` goes to `roster[r % k]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin;

#[async_trait]
impl SpeakerSelector for RoundRobin {
    async fn select(&self, ctx: &SelectionContext<'_>) -> SelectionResult<usize> {
        ctx.round_robin_index()
    }

    fn name(&self) -> &str {
        "round_robin"
    }
}

/// Cycles an explicit list of participant names.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    order: Vec<String>,
}

impl FixedSequence {
    pub fn new(order: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }
}

#[async_trait]
impl SpeakerSelector for FixedSequence {
    async fn select(&self, ctx: &SelectionContext<'_>) -> SelectionResult<usize> {
        if self.order.is_empty() {
            return Err(SelectionError::EmptySequence);
        }
        let name = &self.order[ctx.round as usize % self.order.len()];
        ctx.index_of(name)
            .ok_or_else(|| SelectionError::UnknownParticipant(name.clone()))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Hands the floor to whoever the latest message names.
///
/// The earliest whole-word mention of a roster member other than the
/// previous speaker wins. Without a usable mention it falls back to round
/// robin.
#[derive(Debug, Default, Clone, Copy)]
pub struct MentionSelector;

impl MentionSelector {
    fn mentioned(ctx: &SelectionContext<'_>) -> Option<usize> {
        let latest = ctx.transcript.last()?;
        ctx.roster
            .iter()
            .enumerate()
            .filter(|(i, p)| Some(*i) != ctx.last_speaker && p.name != latest.author)
            .filter_map(|(i, p)| mention_position(&latest.content, &p.name).map(|pos| (pos, i)))
            .min()
            .map(|(_, i)| i)
    }
}

fn mention_position(content: &str, name: &str) -> Option<usize> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    content.match_indices(name).find_map(|(pos, _)| {
        let before = content[..pos].chars().next_back();
        let after = content[pos + name.len()..].chars().next();
        let bounded = before.map_or(true, |c| !is_word(c)) && after.map_or(true, |c| !is_word(c));
        bounded.then_some(pos)
    })
}

#[async_trait]
impl SpeakerSelector for MentionSelector {
    async fn select(&self, ctx: &SelectionContext<'_>) -> SelectionResult<usize> {
        match Self::mentioned(ctx) {
            Some(index) => Ok(index),
            None => ctx.round_robin_index(),
        }
    }

    fn name(&self) -> &str {
        "mention"
    }
}

/// The group-chat manager seam: an external decision maker (typically an
/// LLM call) that names the next speaker.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Name of the next speaker, or `None` to leave the choice to the fallback.
    async fn next_speaker(&self, ctx: &SelectionContext<'_>) -> SelectionResult<Option<String>>;
}

/// Delegates to a [`Manager`], falling back to round robin when it errors,
/// abstains or names someone off the roster.
pub struct ManagerSelector<M> {
    manager: M,
}

impl<M: Manager> ManagerSelector<M> {
    pub fn new(manager: M) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl<M: Manager> SpeakerSelector for ManagerSelector<M> {
    async fn select(&self, ctx: &SelectionContext<'_>) -> SelectionResult<usize> {
        match self.manager.next_speaker(ctx).await {
            Ok(Some(name)) => match ctx.index_of(&name) {
                Some(index) => return Ok(index),
                None => warn!(speaker = %name, "manager chose a speaker off the roster; using round robin"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "manager selection failed; using round robin"),
        }
        ctx.round_robin_index()
    }

    fn name(&self) -> &str {
        "manager"
    }
}

/// Build the selector described by `config`.
pub fn build_selector(config: &SelectionConfig) -> Box<dyn SpeakerSelector> {
    match config {
        SelectionConfig::RoundRobin => Box::new(RoundRobin),
        SelectionConfig::Fixed { order } => Box::new(FixedSequence::new(order.iter().cloned())),
        SelectionConfig::Mention => Box::new(MentionSelector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageKind;
    use crate::roles::Role;

    fn roster() -> Vec<ParticipantConfig> {
        vec![
            ParticipantConfig::new("Designer", Role::Designer),
            ParticipantConfig::new("Programmer", Role::Programmer),
            ParticipantConfig::new("Tester", Role::Tester),
        ]
    }

    fn ctx<'a>(
        round: u32,
        roster: &'a [ParticipantConfig],
        transcript: &'a Transcript,
        last_speaker: Option<usize>,
    ) -> SelectionContext<'a> {
        SelectionContext {
            round,
            roster,
            transcript,
            last_speaker,
        }
    }

    #[tokio::test]
    async fn test_round_robin_cycles_from_head() {
        let roster = roster();
        let t = Transcript::new();
        let mut picked = Vec::new();
        for round in 0..5 {
            picked.push(RoundRobin.select(&ctx(round, &roster, &t, None)).await.unwrap());
        }
        assert_eq!(picked, vec![0, 1, 2, 0, 1]);
    }

    #[tokio::test]
    async fn test_round_robin_empty_roster() {
        let t = Transcript::new();
        let err = RoundRobin.select(&ctx(0, &[], &t, None)).await.unwrap_err();
        assert!(matches!(err, SelectionError::EmptyRoster));
    }

    #[tokio::test]
    async fn test_fixed_sequence_follows_order() {
        let roster = roster();
        let t = Transcript::new();
        let sel = FixedSequence::new(["Tester", "Designer"]);
        assert_eq!(sel.select(&ctx(0, &roster, &t, None)).await.unwrap(), 2);
        assert_eq!(sel.select(&ctx(1, &roster, &t, None)).await.unwrap(), 0);
        assert_eq!(sel.select(&ctx(2, &roster, &t, None)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fixed_sequence_unknown_name() {
        let roster = roster();
        let t = Transcript::new();
        let sel = FixedSequence::new(["Ghost"]);
        let err = sel.select(&ctx(0, &roster, &t, None)).await.unwrap_err();
        assert!(matches!(err, SelectionError::UnknownParticipant(ref n) if n == "Ghost"));
    }

    #[tokio::test]
    async fn test_mention_picks_earliest_named() {
        let roster = roster();
        let mut t = Transcript::new();
        t.append(
            "Designer",
            MessageKind::Text,
            "Tester, please wait; Programmer should implement this first.",
        );
        let picked = MentionSelector.select(&ctx(1, &roster, &t, Some(0))).await.unwrap();
        assert_eq!(picked, 2);
    }

    #[tokio::test]
    async fn test_mention_requires_word_boundary_and_skips_author() {
        let roster = roster();
        let mut t = Transcript::new();
        t.append("Programmer", MessageKind::Text, "As Programmer I asked the Designers to review.");
        // Neither "Programmer" (author) nor "Designers" (no boundary) counts.
        let picked = MentionSelector.select(&ctx(4, &roster, &t, Some(1))).await.unwrap();
        assert_eq!(picked, 4 % 3);
    }

    #[test]
    fn test_mention_position_boundaries() {
        assert_eq!(mention_position("ask Tester now", "Tester"), Some(4));
        assert_eq!(mention_position("Tester.", "Tester"), Some(0));
        assert_eq!(mention_position("Testers and Tester", "Tester"), Some(12));
        assert_eq!(mention_position("App_Tester", "Tester"), None);
    }

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl Manager for Fixed {
        async fn next_speaker(&self, _ctx: &SelectionContext<'_>) -> SelectionResult<Option<String>> {
            Ok(self.0.map(String::from))
        }
    }

    struct Broken;

    #[async_trait]
    impl Manager for Broken {
        async fn next_speaker(&self, _ctx: &SelectionContext<'_>) -> SelectionResult<Option<String>> {
            Err(SelectionError::Manager("model unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_manager_selector_and_fallbacks() {
        let roster = roster();
        let t = Transcript::new();

        let sel = ManagerSelector::new(Fixed(Some("Tester")));
        assert_eq!(sel.select(&ctx(0, &roster, &t, None)).await.unwrap(), 2);

        let sel = ManagerSelector::new(Fixed(Some("Nobody")));
        assert_eq!(sel.select(&ctx(1, &roster, &t, None)).await.unwrap(), 1);

        let sel = ManagerSelector::new(Fixed(None));
        assert_eq!(sel.select(&ctx(2, &roster, &t, None)).await.unwrap(), 2);

        let sel = ManagerSelector::new(Broken);
        assert_eq!(sel.select(&ctx(3, &roster, &t, None)).await.unwrap(), 0);
    }

    #[test]
    fn test_build_selector_names() {
        assert_eq!(build_selector(&SelectionConfig::RoundRobin).name(), "round_robin");
        assert_eq!(
            build_selector(&SelectionConfig::Fixed {
                order: vec!["Designer".into()]
            })
            .name(),
            "fixed"
        );
        assert_eq!(build_selector(&SelectionConfig::Mention).name(), "mention");
    }
}
