//! The round loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::config::{ExhaustedAction, ParticipantConfig, SessionConfig};
use crate::domain::{MessageKind, Result, RoundtableError, Transcript};
use crate::metrics::METRICS;
use crate::obs;
use crate::participant::{Participant, ParticipantError, Reply};
use crate::selection::{build_selector, SelectionContext, SelectionError, SpeakerSelector};
use crate::termination::TerminationMatcher;

use super::cancel::CancelHandle;
use super::settings::OrchestratorSettings;
use super::status::SessionStatus;

/// Result of a single [`Orchestrator::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// One message was appended and the session goes on.
    Continue,
    /// The session is over (this step may or may not have appended).
    Finished(SessionStatus),
}

/// Final state of a session, returned by [`Orchestrator::start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub rounds: u32,
    pub transcript: Transcript,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

enum TurnResult {
    Produced(Reply),
    /// Not worth retrying: surfaced to the group as an execution message.
    ExecutionFailed(ParticipantError),
    Exhausted { error: ParticipantError, attempts: u32 },
    Interrupted(SessionStatus),
}

/// Drives a group chat: picks speakers, collects one message per round and
/// decides when to stop.
///
/// An orchestrator runs exactly one session. [`seed`](Self::seed) opens it and
/// [`step`](Self::step) advances it one round; [`start`](Self::start) does
/// both and loops until a final [`SessionStatus`].
pub struct Orchestrator {
    session_id: Uuid,
    settings: OrchestratorSettings,
    participants: Vec<Arc<dyn Participant>>,
    roster: Vec<ParticipantConfig>,
    selector: Box<dyn SpeakerSelector>,
    termination: TerminationMatcher,
    cancel: CancelHandle,

    transcript: Transcript,
    rounds: u32,
    status: SessionStatus,
    last_speaker: Option<usize>,
    consecutive_failed_turns: u32,
    started_at: Option<DateTime<Utc>>,
    deadline: Option<Instant>,
    started_instant: Option<Instant>,
    finished_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session_id", &self.session_id)
            .field("roster", &self.roster.iter().map(|p| &p.name).collect::<Vec<_>>())
            .field("selector", &self.selector.name())
            .field("rounds", &self.rounds)
            .field("status", &self.status)
            .finish()
    }
}

impl Orchestrator {
    /// Build an orchestrator over `participants`, in roster order.
    pub fn new(
        settings: OrchestratorSettings,
        participants: Vec<Arc<dyn Participant>>,
        selector: Box<dyn SpeakerSelector>,
    ) -> Result<Self> {
        settings.validate()?;
        if participants.is_empty() {
            return Err(RoundtableError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for p in &participants {
            if !seen.insert(p.name().to_string()) {
                return Err(RoundtableError::DuplicateParticipant(p.name().to_string()));
            }
        }
        let termination = TerminationMatcher::new(&settings.termination_pattern)?;
        let roster = participants.iter().map(|p| p.config().clone()).collect();

        Ok(Self {
            session_id: Uuid::new_v4(),
            settings,
            participants,
            roster,
            selector,
            termination,
            cancel: CancelHandle::new(),
            transcript: Transcript::new(),
            rounds: 0,
            status: SessionStatus::Running,
            last_speaker: None,
            consecutive_failed_turns: 0,
            started_at: None,
            deadline: None,
            started_instant: None,
            finished_at: None,
        })
    }

    /// Build from a validated session config. `participants` must match the
    /// configured roster name for name, in order.
    pub fn from_config(
        config: &SessionConfig,
        participants: Vec<Arc<dyn Participant>>,
    ) -> Result<Self> {
        config.validate()?;
        let expected: Vec<&str> = config.participants.iter().map(|p| p.name.as_str()).collect();
        let actual: Vec<&str> = participants.iter().map(|p| p.name()).collect();
        if expected != actual {
            return Err(RoundtableError::InvalidConfig(format!(
                "participants {actual:?} do not match configured roster {expected:?}"
            )));
        }
        Self::new(
            OrchestratorSettings::from_config(config),
            participants,
            build_selector(&config.selection),
        )
    }

    /// Share an externally owned cancel handle (e.g. one wired to Ctrl-C).
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn roster(&self) -> &[ParticipantConfig] {
        &self.roster
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.roster.iter().position(|p| p.name == name)
    }

    /// Append the seed message and open the session.
    pub fn seed(&mut self, content: impl Into<String>, author: &str) -> Result<()> {
        if self.started_at.is_some() {
            return Err(RoundtableError::AlreadyStarted(self.session_id));
        }
        if self.index_of(author).is_none() {
            return Err(RoundtableError::UnknownParticipant(author.to_string()));
        }

        let now = Instant::now();
        self.started_at = Some(Utc::now());
        self.started_instant = Some(now);
        self.deadline = self.settings.wall_clock_limit.map(|limit| now + limit);

        let seq = self.transcript.append(author, MessageKind::Seed, content).seq;
        obs::emit_session_started(
            &self.session_id.to_string(),
            self.roster.len(),
            self.settings.round_ceiling,
            self.selector.name(),
        );
        obs::emit_message_appended(seq, author, "seed");
        Ok(())
    }

    /// Seed the session and run it to completion.
    pub async fn start(
        &mut self,
        seed: impl Into<String>,
        initial_speaker: &str,
    ) -> Result<SessionOutcome> {
        let span = obs::session_span(&self.session_id.to_string());
        let seed = seed.into();
        async move {
            self.seed(seed, initial_speaker)?;
            self.run().await
        }
        .instrument(span)
        .await
    }

    /// Step until the session finishes. The session must have been seeded.
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        while let StepOutcome::Continue = self.step().await? {}
        self.outcome()
    }

    /// Advance the session by one round.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        if self.started_at.is_none() {
            return Err(RoundtableError::NotStarted(self.session_id));
        }
        if self.status.is_finished() {
            return Ok(StepOutcome::Finished(self.status.clone()));
        }
        if let Some(status) = self.pre_step_stop() {
            return Ok(self.finish(status));
        }

        let speaker = match self.select_speaker().await {
            Ok(index) => index,
            Err(e) => {
                return Ok(self.finish(SessionStatus::Failed {
                    participant: None,
                    reason: e.to_string(),
                }))
            }
        };
        let name = self.roster[speaker].name.clone();
        obs::emit_speaker_selected(self.rounds, &name);

        match self.produce_with_retry(speaker).await {
            TurnResult::Interrupted(status) => Ok(self.finish(status)),
            TurnResult::Produced(Reply::Decline { reason }) => {
                debug!(speaker = %name, reason = %reason, "participant declined to continue");
                Ok(self.finish(SessionStatus::Declined { by: name, reason }))
            }
            TurnResult::Produced(Reply::Text(content)) => {
                let terminates = self.termination.is_match(&content);
                self.record(speaker, MessageKind::Text, content);
                if terminates {
                    return Ok(self.finish(SessionStatus::Terminated { by: name }));
                }
                Ok(self.after_round())
            }
            TurnResult::Produced(Reply::Execution { report, .. }) => {
                self.record(speaker, MessageKind::Execution, report);
                Ok(self.after_round())
            }
            TurnResult::ExecutionFailed(error) => {
                obs::emit_execution_failed(&name, &error);
                self.record(speaker, MessageKind::Execution, error.to_string());
                Ok(self.after_round())
            }
            TurnResult::Exhausted { error, attempts } => Ok(self.fail_turn(speaker, error, attempts)),
        }
    }

    /// Snapshot of the session as it stands. Only valid once seeded.
    pub fn outcome(&self) -> Result<SessionOutcome> {
        let started_at = self
            .started_at
            .ok_or(RoundtableError::NotStarted(self.session_id))?;
        Ok(SessionOutcome {
            session_id: self.session_id,
            status: self.status.clone(),
            rounds: self.rounds,
            transcript: self.transcript.clone(),
            started_at,
            finished_at: self.finished_at.unwrap_or_else(Utc::now),
        })
    }

    fn pre_step_stop(&self) -> Option<SessionStatus> {
        if self.cancel.is_cancelled() {
            return Some(SessionStatus::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(self.deadline_status());
        }
        if self.rounds >= self.settings.round_ceiling {
            return Some(SessionStatus::RoundLimitReached {
                rounds: self.rounds,
            });
        }
        None
    }

    fn deadline_status(&self) -> SessionStatus {
        SessionStatus::DeadlineExceeded {
            limit_secs: self
                .settings
                .wall_clock_limit
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        }
    }

    async fn select_speaker(&self) -> std::result::Result<usize, SelectionError> {
        let ctx = SelectionContext {
            round: self.rounds,
            roster: &self.roster,
            transcript: &self.transcript,
            last_speaker: self.last_speaker,
        };
        let index = self.selector.select(&ctx).await?;
        if index >= self.roster.len() {
            return Err(SelectionError::OutOfRange {
                index,
                len: self.roster.len(),
            });
        }
        Ok(index)
    }

    /// Run one participant's turn with timeout, retry and backoff, racing
    /// cancellation and the wall-clock deadline.
    async fn produce_with_retry(&self, speaker: usize) -> TurnResult {
        let participant = Arc::clone(&self.participants[speaker]);
        let name = participant.name().to_string();
        let window = self.transcript.tail(participant.config().message_window);
        let max_attempts = self.settings.failure.max_retries.saturating_add(1);
        let limit = (!participant.is_interactive()).then_some(self.settings.production_timeout);

        let mut attempt = 1;
        loop {
            let produced = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return TurnResult::Interrupted(SessionStatus::Cancelled),
                _ = wait_until(self.deadline) => return TurnResult::Interrupted(self.deadline_status()),
                r = produce_within(limit, participant.produce(window)) => r,
            };

            let error = match produced {
                Ok(Ok(reply)) => return TurnResult::Produced(reply),
                Ok(Err(e @ ParticipantError::Execution(_))) => return TurnResult::ExecutionFailed(e),
                Ok(Err(e)) => e,
                Err(_elapsed) => ParticipantError::Timeout {
                    participant: name.clone(),
                    limit_secs: self.settings.production_timeout.as_secs(),
                },
            };

            if attempt >= max_attempts || !error.is_retryable() {
                return TurnResult::Exhausted { error, attempts: attempt };
            }

            obs::emit_production_retry(&name, attempt, &error);
            METRICS.inc_retries();
            let delay = self.settings.backoff(attempt);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return TurnResult::Interrupted(SessionStatus::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    fn record(&mut self, speaker: usize, kind: MessageKind, content: String) {
        let author = &self.roster[speaker].name;
        let seq = self.transcript.append(author.as_str(), kind, content).seq;
        obs::emit_message_appended(seq, author, &kind.to_string());
        self.rounds += 1;
        self.last_speaker = Some(speaker);
        if kind != MessageKind::Error {
            self.consecutive_failed_turns = 0;
        }
        METRICS.inc_turns();
    }

    fn after_round(&mut self) -> StepOutcome {
        if self.rounds >= self.settings.round_ceiling {
            return self.finish(SessionStatus::RoundLimitReached {
                rounds: self.rounds,
            });
        }
        StepOutcome::Continue
    }

    fn fail_turn(&mut self, speaker: usize, error: ParticipantError, attempts: u32) -> StepOutcome {
        let name = self.roster[speaker].name.clone();
        obs::emit_turn_failed(&name, &error);
        METRICS.inc_failed_turns();
        self.record(
            speaker,
            MessageKind::Error,
            format!("{name} failed after {attempts} attempt(s): {error}"),
        );
        self.consecutive_failed_turns += 1;

        match self.settings.failure.on_exhausted {
            ExhaustedAction::EndSession => self.finish(SessionStatus::Failed {
                participant: Some(name),
                reason: error.to_string(),
            }),
            ExhaustedAction::Advance => {
                let threshold = self.settings.failure.max_consecutive_failed_turns;
                if self.consecutive_failed_turns >= threshold {
                    return self.finish(SessionStatus::Failed {
                        participant: None,
                        reason: format!("{threshold} consecutive failed turns"),
                    });
                }
                self.after_round()
            }
        }
    }

    fn finish(&mut self, status: SessionStatus) -> StepOutcome {
        self.status = status.clone();
        self.finished_at = Some(Utc::now());
        let elapsed_ms = self
            .started_instant
            .map(|s| s.elapsed().as_millis() as u64)
            .unwrap_or_default();
        obs::emit_session_finished(
            &self.session_id.to_string(),
            status.label(),
            self.rounds,
            self.transcript.len(),
            elapsed_ms,
        );
        METRICS.flush();
        StepOutcome::Finished(status)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

/// Await `fut`, bounded by `limit` when one is given.
async fn produce_within<F: std::future::Future>(
    limit: Option<Duration>,
    fut: F,
) -> std::result::Result<F::Output, tokio::time::error::Elapsed> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await,
        None => Ok(fut.await),
    }
}
