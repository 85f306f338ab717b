//! Roundtable Core Library
//!
//! Turn-managed group chat for role-playing participants: a round
//! orchestrator over a shared append-only transcript, pluggable speaker
//! selection, bounded code execution and human-in-the-loop confirmation.

pub mod config;
pub mod domain;
pub mod hitl;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod participant;
pub mod preset;
pub mod reporting;
pub mod roles;
pub mod sandbox;
pub mod selection;
pub mod telemetry;
pub mod termination;

pub use config::{
    ExhaustedAction, FailurePolicy, ModelProfile, ParticipantConfig, SelectionConfig,
    SessionConfig, TerminationConfig,
};

pub use domain::{digest_messages, Message, MessageKind, Result, RoundtableError, Transcript};

pub use hitl::{
    AutoApprove, ConfirmationChannel, ConfirmationDecision, ConfirmationRequest, HitlError,
    HitlResult, PendingConfirmation, QueueConfirmation, ScriptedConfirmation,
};

pub use orchestrator::{
    CancelHandle, Orchestrator, OrchestratorSettings, SessionOutcome, SessionStatus, StepOutcome,
};

pub use participant::{
    Participant, ParticipantError, ParticipantResult, ProxyParticipant, Reply, ScriptStep,
    ScriptedParticipant,
};

pub use preset::{code_translation_session, code_translation_session_in, DEFAULT_WORK_DIR};

pub use reporting::{
    read_transcript_artifact, render_transcript_md, write_transcript_json, write_transcript_md,
    TranscriptArtifact,
};

pub use roles::Role;

pub use sandbox::{
    CodeBlock, CodeExecutor, ExecutionConfig, ExecutionOutcome, ExecutionStatus, SandboxError,
    ScriptLanguage, WorkDir,
};

pub use selection::{
    build_selector, FixedSequence, Manager, ManagerSelector, MentionSelector, RoundRobin,
    SelectionContext, SelectionError, SpeakerSelector,
};

pub use telemetry::{init_tracing, LogOptions};

pub use termination::TerminationMatcher;

/// Roundtable version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
