//! Input and outcome event types, and the two outcome payload shapes.

use {
    chrono::{DateTime, Utc},
    herald_common::{AgentId, EventId, Payload},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::poster::PostReceipt;

/// Payload keys written on every outcome.
pub mod keys {
    pub const SUCCESS: &str = "success";
    pub const PUBLISHED_TEXT: &str = "publishedText";
    pub const REMOTE_ID: &str = "remoteId";
    pub const REMOTE_ID_STR: &str = "remoteIdStr";
    pub const ERROR: &str = "error";
    pub const FAILED_TEXT: &str = "failedText";
    pub const AGENT_ID: &str = "agentId";
    pub const EVENT_ID: &str = "eventId";
    pub const DRY_RUN: &str = "dryRun";
}

/// An upstream event handed to the pipeline. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub id: EventId,
    /// Agent that created this event.
    pub agent_id: AgentId,
    #[serde(default)]
    pub payload: Payload,
}

impl InputEvent {
    pub fn new(id: EventId, agent_id: AgentId, payload: Payload) -> Self {
        Self {
            id,
            agent_id,
            payload,
        }
    }
}

/// An event produced by the pipeline, one per admitted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeEvent {
    /// Agent that produced the outcome (this unit).
    pub agent_id: AgentId,
    pub created_at: DateTime<Utc>,
    pub payload: Payload,
}

impl OutcomeEvent {
    /// True only when the payload's `success` field is literally `true`.
    pub fn is_success(&self) -> bool {
        self.payload.get(keys::SUCCESS) == Some(&Value::Bool(true))
    }
}

/// An outcome after the store assigned it an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOutcome {
    pub id: EventId,
    #[serde(flatten)]
    pub event: OutcomeEvent,
}

/// Overlay the success shape onto `base`.
pub(crate) fn success_payload(
    mut base: Payload,
    source: &InputEvent,
    text: &str,
    receipt: &PostReceipt,
) -> Payload {
    base.insert(keys::SUCCESS.into(), Value::Bool(true));
    base.insert(keys::PUBLISHED_TEXT.into(), Value::from(text));
    base.insert(keys::REMOTE_ID.into(), Value::from(receipt.id));
    base.insert(keys::REMOTE_ID_STR.into(), Value::from(receipt.id_str.as_str()));
    stamp_source(&mut base, source);
    base
}

/// Overlay the failure shape onto `base`.
pub(crate) fn failure_payload(
    mut base: Payload,
    source: &InputEvent,
    text: &str,
    error: &str,
) -> Payload {
    base.insert(keys::SUCCESS.into(), Value::Bool(false));
    base.insert(keys::ERROR.into(), Value::from(error));
    base.insert(keys::FAILED_TEXT.into(), Value::from(text));
    stamp_source(&mut base, source);
    base
}

/// Shape recorded for a dry run: rendered text, no remote identifiers.
pub(crate) fn dry_run_payload(mut base: Payload, source: &InputEvent, text: &str) -> Payload {
    base.insert(keys::SUCCESS.into(), Value::Bool(true));
    base.insert(keys::PUBLISHED_TEXT.into(), Value::from(text));
    base.insert(keys::DRY_RUN.into(), Value::Bool(true));
    stamp_source(&mut base, source);
    base
}

fn stamp_source(payload: &mut Payload, source: &InputEvent) {
    payload.insert(keys::AGENT_ID.into(), source.agent_id.into());
    payload.insert(keys::EVENT_ID.into(), source.id.into());
}
