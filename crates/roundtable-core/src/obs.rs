//! Structured observability hooks for session lifecycle events.
//!
//! Every function emits a single `tracing` event with an `event = "..."` field
//! so log pipelines can filter on it. Turn-level events are emitted inside the
//! `roundtable.session` span returned by [`session_span`], which carries the
//! session id.

use tracing::{debug, info, warn};

/// Span covering one session run. Instrument the session future with it.
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("roundtable.session", session_id = %session_id)
}

pub fn emit_session_started(session_id: &str, participants: usize, round_ceiling: u32, selector: &str) {
    info!(
        event = "session.started",
        session_id = %session_id,
        participants = participants,
        round_ceiling = round_ceiling,
        selector = %selector,
    );
}

pub fn emit_speaker_selected(round: u32, speaker: &str) {
    debug!(event = "turn.selected", round = round, speaker = %speaker);
}

pub fn emit_message_appended(seq: u64, author: &str, kind: &str) {
    info!(event = "turn.message_appended", seq = seq, author = %author, kind = %kind);
}

/// Emit event: a production attempt failed and will be retried.
pub fn emit_production_retry(speaker: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(event = "turn.retry", speaker = %speaker, attempt = attempt, error = %error);
}

/// Emit event: the retry budget ran out for a turn.
pub fn emit_turn_failed(speaker: &str, error: &dyn std::fmt::Display) {
    warn!(event = "turn.failed", speaker = %speaker, error = %error);
}

pub fn emit_confirmation_requested(participant: &str, pending_code: usize, channel: &str) {
    info!(
        event = "confirmation.requested",
        participant = %participant,
        pending_code = pending_code,
        channel = %channel,
    );
}

pub fn emit_execution_finished(participant: &str, filename: &str, exit_code: i32, duration_ms: u64) {
    info!(
        event = "execution.finished",
        participant = %participant,
        file = %filename,
        exit_code = exit_code,
        duration_ms = duration_ms,
    );
}

pub fn emit_execution_failed(participant: &str, error: &dyn std::fmt::Display) {
    warn!(event = "execution.failed", participant = %participant, error = %error);
}

pub fn emit_session_finished(
    session_id: &str,
    status: &str,
    rounds: u32,
    messages: usize,
    duration_ms: u64,
) {
    info!(
        event = "session.finished",
        session_id = %session_id,
        status = %status,
        rounds = rounds,
        messages = messages,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_span_create() {
        let span = session_span("test-session");
        let _entered = span.enter();
    }
}
