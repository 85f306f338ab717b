//! User-proxy participant: runs code from the chat and/or defers to a human.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ParticipantConfig;
use crate::domain::Message;
use crate::hitl::{ConfirmationChannel, ConfirmationDecision, ConfirmationRequest};
use crate::metrics::METRICS;
use crate::obs;
use crate::sandbox::{
    latest_code_blocks, CodeBlock, CodeExecutor, ExecutionConfig, ExecutionOutcome,
    ExecutionStatus, WorkDir,
};

use super::error::{ParticipantError, ParticipantResult};
use super::{Participant, Reply};

/// Acts for a human operator and/or as a code runner.
///
/// On each turn it looks for fenced code in its visible window (the most
/// recent message that has any). With human confirmation it first asks the
/// injected [`ConfirmationChannel`]; the human may approve, answer with their
/// own text, reject the pending code, or abort the session. Without an
/// executor the automatic reply is a short acknowledgement.
pub struct ProxyParticipant {
    config: ParticipantConfig,
    executor: Option<CodeExecutor>,
    confirmation: Option<Arc<dyn ConfirmationChannel>>,
}

impl std::fmt::Debug for ProxyParticipant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyParticipant")
            .field("name", &self.config.name)
            .field("executor", &self.executor)
            .field(
                "confirmation",
                &self.confirmation.as_ref().map(|c| c.name().to_string()),
            )
            .finish()
    }
}

impl ProxyParticipant {
    pub fn new(config: ParticipantConfig) -> Self {
        Self {
            config,
            executor: None,
            confirmation: None,
        }
    }

    /// Build from config: opens the working directory when execution is
    /// enabled and requires a channel when human confirmation is on.
    pub fn from_config(
        config: ParticipantConfig,
        confirmation: Option<Arc<dyn ConfirmationChannel>>,
    ) -> ParticipantResult<Self> {
        let mut participant = Self::new(config);

        if participant.config.execution_enabled {
            let dir = participant
                .config
                .working_directory
                .clone()
                .ok_or_else(|| participant.misconfigured("execution enabled without a working directory"))?;
            let workdir = WorkDir::open(dir)?;
            let exec_config = ExecutionConfig {
                timeout_secs: participant.config.timeout_secs,
                ..ExecutionConfig::default()
            };
            participant.executor = Some(CodeExecutor::new(workdir, exec_config)?);
        }

        if participant.config.human_confirmation {
            let channel = confirmation
                .ok_or_else(|| participant.misconfigured("human confirmation without a channel"))?;
            participant.confirmation = Some(channel);
        }

        Ok(participant)
    }

    pub fn with_executor(mut self, executor: CodeExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_confirmation(mut self, channel: Arc<dyn ConfirmationChannel>) -> Self {
        self.confirmation = Some(channel);
        self
    }

    pub fn executor(&self) -> Option<&CodeExecutor> {
        self.executor.as_ref()
    }

    fn misconfigured(&self, reason: &str) -> ParticipantError {
        ParticipantError::Misconfigured {
            participant: self.config.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn prompt_for(&self, pending: &[CodeBlock]) -> String {
        if pending.is_empty() {
            format!(
                "{}: reply to the group, press enter to continue, or type 'exit' to end the session.",
                self.config.name
            )
        } else {
            format!(
                "{}: {} code block(s) pending. Press enter to run them, type feedback to reply \
                 instead, 'reject' to skip them, or 'exit' to end the session.",
                self.config.name,
                pending.len()
            )
        }
    }

    async fn auto_reply(&self, blocks: &[CodeBlock]) -> Reply {
        let Some(executor) = &self.executor else {
            return Reply::Text(format!("{} has no further feedback.", self.config.name));
        };
        if blocks.is_empty() {
            let scope = match self.config.message_window {
                Some(n) => format!("the last {n} message(s)"),
                None => "the conversation".to_string(),
            };
            return Reply::Text(format!("No code blocks found in {scope} to execute."));
        }

        let mut sections = Vec::with_capacity(blocks.len());
        let mut outcomes = Vec::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            METRICS.inc_executions();
            match executor.execute(block).await {
                Ok(outcome) => {
                    obs::emit_execution_finished(
                        &self.config.name,
                        &outcome.filename,
                        outcome.exit_code(),
                        outcome.duration_ms,
                    );
                    sections.push(render_outcome(i, &outcome));
                    let stop = !outcome.succeeded();
                    outcomes.push(outcome);
                    if stop {
                        break;
                    }
                }
                Err(err) => {
                    obs::emit_execution_failed(&self.config.name, &err);
                    sections.push(format!(
                        "block {}: exitcode: 1 (execution failed)\nCode output: {err}",
                        i + 1
                    ));
                    break;
                }
            }
        }

        Reply::Execution {
            report: sections.join("\n\n"),
            outcomes,
        }
    }
}

fn render_outcome(index: usize, outcome: &ExecutionOutcome) -> String {
    let header = match &outcome.status {
        ExecutionStatus::Exited { code: 0 } => "exitcode: 0 (execution succeeded)".to_string(),
        ExecutionStatus::Exited { code } => format!("exitcode: {code} (execution failed)"),
        ExecutionStatus::TimedOut { limit_secs } => {
            format!("exitcode: -1 (execution timed out after {limit_secs}s)")
        }
        ExecutionStatus::Killed => "exitcode: -1 (execution killed by signal)".to_string(),
    };
    let mut body = outcome.stdout.clone();
    if !outcome.stderr.is_empty() {
        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        body.push_str(&outcome.stderr);
    }
    if matches!(outcome.status, ExecutionStatus::TimedOut { .. }) {
        body.push_str("[output unavailable: timed out]");
    }
    format!(
        "block {} ({}, {}): {header}\nCode output:\n{body}",
        index + 1,
        outcome.filename,
        outcome.language
    )
}

#[async_trait]
impl Participant for ProxyParticipant {
    fn config(&self) -> &ParticipantConfig {
        &self.config
    }

    async fn produce(&self, window: &[Message]) -> ParticipantResult<Reply> {
        let blocks = if self.executor.is_some() {
            latest_code_blocks(window)
        } else {
            Vec::new()
        };

        if self.config.human_confirmation {
            let channel = self
                .confirmation
                .as_ref()
                .ok_or_else(|| self.misconfigured("human confirmation without a channel"))?;
            METRICS.inc_confirmations();
            obs::emit_confirmation_requested(&self.config.name, blocks.len(), channel.name());

            let request = ConfirmationRequest::new(
                self.config.name.clone(),
                self.prompt_for(&blocks),
                blocks.clone(),
                window.last().cloned(),
            );
            match channel.confirm(request).await? {
                ConfirmationDecision::Approve => {}
                ConfirmationDecision::Reply { text } => return Ok(Reply::Text(text)),
                ConfirmationDecision::Reject { reason } => {
                    return Ok(Reply::Text(format!("Execution rejected: {reason}")))
                }
                ConfirmationDecision::Abort { reason } => return Ok(Reply::Decline { reason }),
            }
        }

        Ok(self.auto_reply(&blocks).await)
    }
}
