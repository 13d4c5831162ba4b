//! Outcome persistence: the sink the pipeline writes to and the queries the
//! health check reads from.

use {async_trait::async_trait, herald_common::{AgentId, EventId}};

use crate::{
    Result,
    event::{OutcomeEvent, StoredOutcome},
};

/// Accepts outcome events in emission order.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &OutcomeEvent) -> Result<EventId>;
}

/// Read access to previously emitted outcomes.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Most recently created outcome of `agent_id`.
    async fn latest_outcome(&self, agent_id: AgentId) -> Result<Option<StoredOutcome>>;

    /// The last `limit` outcomes of `agent_id`, oldest first.
    async fn list_outcomes(&self, agent_id: AgentId, limit: usize) -> Result<Vec<StoredOutcome>>;
}
