//! In-memory outcome store for tests and dry runs.

use std::sync::Mutex;

use {
    async_trait::async_trait,
    herald_common::{AgentId, EventId},
};

use crate::{
    Result,
    event::{OutcomeEvent, StoredOutcome},
    store::{EventSink, EventStore},
};

/// Store backed by a `Vec`. No persistence.
pub struct InMemoryStore {
    events: Mutex<Vec<StoredOutcome>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Every stored outcome, in emission order.
    pub fn all(&self) -> Vec<StoredOutcome> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for InMemoryStore {
    async fn emit(&self, event: &OutcomeEvent) -> Result<EventId> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let id = EventId(events.len() as i64 + 1);
        events.push(StoredOutcome {
            id,
            event: event.clone(),
        });
        Ok(id)
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn latest_outcome(&self, agent_id: AgentId) -> Result<Option<StoredOutcome>> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        Ok(events
            .iter()
            .rev()
            .find(|e| e.event.agent_id == agent_id)
            .cloned())
    }

    async fn list_outcomes(&self, agent_id: AgentId, limit: usize) -> Result<Vec<StoredOutcome>> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let matching: Vec<StoredOutcome> = events
            .iter()
            .filter(|e| e.event.agent_id == agent_id)
            .cloned()
            .collect();
        let start = matching.len().saturating_sub(limit);
        Ok(matching[start..].to_vec())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::Utc, herald_common::Payload, serde_json::json};

    fn outcome(agent: i64, success: bool) -> OutcomeEvent {
        let mut payload = Payload::new();
        payload.insert("success".into(), json!(success));
        OutcomeEvent {
            agent_id: AgentId(agent),
            created_at: Utc::now(),
            payload,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let store = InMemoryStore::new();
        assert_eq!(store.emit(&outcome(1, true)).await.unwrap(), EventId(1));
        assert_eq!(store.emit(&outcome(1, true)).await.unwrap(), EventId(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn latest_is_scoped_to_agent() {
        let store = InMemoryStore::new();
        store.emit(&outcome(1, true)).await.unwrap();
        store.emit(&outcome(2, false)).await.unwrap();

        let latest = store.latest_outcome(AgentId(1)).await.unwrap().unwrap();
        assert_eq!(latest.id, EventId(1));
        assert!(latest.event.is_success());
        assert!(store.latest_outcome(AgentId(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_most_recent_oldest_first() {
        let store = InMemoryStore::new();
        for _ in 0..5 {
            store.emit(&outcome(1, true)).await.unwrap();
        }
        let listed = store.list_outcomes(AgentId(1), 3).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, [3, 4, 5]);
    }
}
