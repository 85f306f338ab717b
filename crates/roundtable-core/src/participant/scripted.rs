//! Participant that replays a fixed script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{ModelProfile, ParticipantConfig};
use crate::domain::Message;

use super::error::{ParticipantError, ParticipantResult};
use super::{Participant, Reply};

/// One scripted turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "value", rename_all = "snake_case")]
pub enum ScriptStep {
    Say(String),
    /// Fail the production call with this reason.
    Fail(String),
    Decline(String),
    /// Never answer; exercises the production timeout.
    Stall,
}

impl From<&str> for ScriptStep {
    fn from(text: &str) -> Self {
        ScriptStep::Say(text.to_string())
    }
}

/// Replays [`ScriptStep`]s in order.
///
/// A one-shot script fails with a production error once it runs out; a
/// cycling script starts over.
#[derive(Debug)]
pub struct ScriptedParticipant {
    config: ParticipantConfig,
    model: Option<Arc<ModelProfile>>,
    steps: Mutex<VecDeque<ScriptStep>>,
    cycle: bool,
    calls: AtomicUsize,
}

impl ScriptedParticipant {
    pub fn new(config: ParticipantConfig, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            config,
            model: None,
            steps: Mutex::new(steps.into_iter().collect()),
            cycle: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A script that repeats from the top when exhausted.
    pub fn cycling(config: ParticipantConfig, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            cycle: true,
            ..Self::new(config, steps)
        }
    }

    pub fn with_model(mut self, model: Arc<ModelProfile>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn model(&self) -> Option<&ModelProfile> {
        self.model.as_deref()
    }

    /// Number of `produce` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Participant for ScriptedParticipant {
    fn config(&self) -> &ParticipantConfig {
        &self.config
    }

    async fn produce(&self, _window: &[Message]) -> ParticipantResult<Reply> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let step = {
            let mut steps = self.steps.lock().await;
            let step = steps.pop_front();
            if self.cycle {
                if let Some(s) = &step {
                    steps.push_back(s.clone());
                }
            }
            step
        };

        match step {
            Some(ScriptStep::Say(text)) => Ok(Reply::Text(text)),
            Some(ScriptStep::Fail(reason)) => Err(ParticipantError::Production {
                participant: self.config.name.clone(),
                reason,
            }),
            Some(ScriptStep::Decline(reason)) => Ok(Reply::Decline { reason }),
            Some(ScriptStep::Stall) => std::future::pending().await,
            None => Err(ParticipantError::Production {
                participant: self.config.name.clone(),
                reason: "script exhausted".into(),
            }),
        }
    }
}
