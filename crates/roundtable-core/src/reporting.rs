//! Transcript artifacts: `transcript.json` and `transcript.md`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{digest_messages, Message, MessageKind, Result, RoundtableError};
use crate::orchestrator::{SessionOutcome, SessionStatus};

pub const TRANSCRIPT_SCHEMA_VERSION: &str = "1.0";

/// Persisted record of a finished session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub rounds: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// SHA-256 over the serialized `messages`.
    pub digest: String,
    pub messages: Vec<Message>,
}

impl TranscriptArtifact {
    pub fn from_outcome(outcome: &SessionOutcome) -> Result<Self> {
        Ok(Self {
            schema_version: TRANSCRIPT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            session_id: outcome.session_id,
            status: outcome.status.clone(),
            rounds: outcome.rounds,
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            digest: outcome.transcript.digest()?,
            messages: outcome.transcript.messages().to_vec(),
        })
    }

    /// Recompute the digest and compare it with the recorded one.
    pub fn verify(&self) -> Result<()> {
        let actual = digest_messages(&self.messages)?;
        if actual != self.digest {
            return Err(RoundtableError::DigestMismatch {
                expected: self.digest.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Write `transcript.json` in pretty JSON format.
pub fn write_transcript_json(path: &Path, artifact: &TranscriptArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load `transcript.json` and verify its digest.
pub fn read_transcript_artifact(path: &Path) -> Result<TranscriptArtifact> {
    let raw = std::fs::read_to_string(path)?;
    let artifact: TranscriptArtifact = serde_json::from_str(&raw)?;
    artifact.verify()?;
    Ok(artifact)
}

/// Render a human-readable transcript.
pub fn render_transcript_md(artifact: &TranscriptArtifact) -> String {
    let mut out = String::new();
    out.push_str("# Session Transcript\n\n");
    out.push_str(&format!(
        "- session: `{}`\n- status: {}\n- rounds: {}\n- messages: {}\n- started: {}\n- finished: {}\n- digest: `{}`\n\n",
        artifact.session_id,
        artifact.status,
        artifact.rounds,
        artifact.messages.len(),
        artifact.started_at.to_rfc3339(),
        artifact.finished_at.to_rfc3339(),
        artifact.digest,
    ));

    for m in &artifact.messages {
        let tag = match m.kind {
            MessageKind::Text => String::new(),
            other => format!(" _({other})_"),
        };
        out.push_str(&format!("## {}. {}{}\n\n", m.seq, m.author, tag));
        match m.kind {
            MessageKind::Execution => {
                out.push_str("```text\n");
                out.push_str(m.content.trim_end());
                out.push_str("\n```\n\n");
            }
            _ => {
                out.push_str(m.content.trim_end());
                out.push_str("\n\n");
            }
        }
    }
    out
}

/// Write `transcript.md`.
pub fn write_transcript_md(path: &Path, artifact: &TranscriptArtifact) -> Result<()> {
    std::fs::write(path, render_transcript_md(artifact))?;
    Ok(())
}
