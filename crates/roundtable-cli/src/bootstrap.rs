//! Session bootstrap: turn a [`SessionConfig`] into a runnable roster.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use roundtable_core::{
    ConfirmationChannel, Participant, ProxyParticipant, ScriptStep, ScriptedParticipant,
    SessionConfig,
};
use serde::Deserialize;
use tracing::{debug, warn};

/// One canned reply: a bare string is said verbatim, a table is a full step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReplyEntry {
    Text(String),
    Step(ScriptStep),
}

impl From<ReplyEntry> for ScriptStep {
    fn from(entry: ReplyEntry) -> Self {
        match entry {
            ReplyEntry::Text(text) => ScriptStep::Say(text),
            ReplyEntry::Step(step) => step,
        }
    }
}

/// Canned replies for the non-interactive participants, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Replies(BTreeMap<String, Vec<ReplyEntry>>);

impl Replies {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read replies file {:?}", path))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).context("parse replies JSON"),
            Some("toml") => toml::from_str(&raw).context("parse replies TOML"),
            other => bail!("unsupported replies file extension {:?}", other),
        }
    }

    fn take(&mut self, name: &str) -> Vec<ScriptStep> {
        self.0
            .remove(name)
            .unwrap_or_default()
            .into_iter()
            .map(ScriptStep::from)
            .collect()
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Build participants in roster order.
///
/// Participants that execute code or need a human become
/// [`ProxyParticipant`]s wired to `confirmation`; everyone else replays their
/// canned replies and shares the session's model profile.
pub fn build_roster(
    config: &SessionConfig,
    mut replies: Replies,
    confirmation: Arc<dyn ConfirmationChannel>,
) -> Result<Vec<Arc<dyn Participant>>> {
    let model = config.model.clone().map(Arc::new);
    let mut roster: Vec<Arc<dyn Participant>> = Vec::with_capacity(config.participants.len());

    for p in &config.participants {
        if p.execution_enabled || p.human_confirmation {
            let channel = p.human_confirmation.then(|| Arc::clone(&confirmation));
            let proxy = ProxyParticipant::from_config(p.clone(), channel)
                .with_context(|| format!("build participant {}", p.name))?;
            debug!(participant = %p.name, role = %p.role, "proxy participant ready");
            roster.push(Arc::new(proxy));
            continue;
        }

        let steps = replies.take(&p.name);
        if steps.is_empty() {
            warn!(participant = %p.name, "no canned replies; its first turn will fail");
        }
        let mut scripted = ScriptedParticipant::new(p.clone(), steps);
        if let Some(model) = &model {
            scripted = scripted.with_model(Arc::clone(model));
        }
        roster.push(Arc::new(scripted));
    }

    for unused in replies.names() {
        warn!(participant = %unused, "replies given for a participant that is not scripted");
    }
    Ok(roster)
}
