//! JSONL file-backed outcome store.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    herald_common::{AgentId, EventId},
    tokio::{fs, io::AsyncWriteExt, sync::Mutex},
    tracing::warn,
};

use crate::{
    Result,
    error::Context,
    event::{OutcomeEvent, StoredOutcome},
    store::{EventSink, EventStore},
};

/// Append-only store: one JSON object per line.
pub struct FileStore {
    path: PathBuf,
    /// Next id to assign; loaded from the file on first emit.
    next_id: Mutex<Option<i64>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_id: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_all(&self) -> Result<Vec<StoredOutcome>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let mut events = Vec::new();
        for (lineno, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredOutcome>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping unreadable outcome line"
                    );
                },
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl EventSink for FileStore {
    async fn emit(&self, event: &OutcomeEvent) -> Result<EventId> {
        let mut next_id = self.next_id.lock().await;
        let id = match *next_id {
            Some(id) => id,
            None => {
                self.load_all()
                    .await?
                    .iter()
                    .map(|e| e.id.0)
                    .max()
                    .unwrap_or(0)
                    + 1
            },
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let stored = StoredOutcome {
            id: EventId(id),
            event: event.clone(),
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?
            .write_all(line.as_bytes())
            .await?;

        *next_id = Some(id + 1);
        Ok(EventId(id))
    }
}

#[async_trait]
impl EventStore for FileStore {
    async fn latest_outcome(&self, agent_id: AgentId) -> Result<Option<StoredOutcome>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .rev()
            .find(|e| e.event.agent_id == agent_id))
    }

    async fn list_outcomes(&self, agent_id: AgentId, limit: usize) -> Result<Vec<StoredOutcome>> {
        let matching: Vec<StoredOutcome> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|e| e.event.agent_id == agent_id)
            .collect();
        let start = matching.len().saturating_sub(limit);
        Ok(matching[start..].to_vec())
    }
}
