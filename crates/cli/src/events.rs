//! Reading input events for `herald run`.
//!
//! The file is either a JSON array or JSON Lines. Each entry is a full
//! event (an object carrying all of `id`, `agentId` and `payload`) or a bare
//! payload object, which gets its 1-based position as id and agent id 0.

use std::path::Path;

use {
    anyhow::{Context, Result, bail},
    herald_common::{AgentId, EventId, types::payload_from_value},
    herald_publish::InputEvent,
    serde_json::Value,
};

pub fn read_events(path: &Path) -> Result<Vec<InputEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read events from {}", path.display()))?;
    parse_events(&raw).with_context(|| format!("invalid events file {}", path.display()))
}

pub fn parse_events(raw: &str) -> Result<Vec<InputEvent>> {
    let values: Vec<Value> = if raw.trim_start().starts_with('[') {
        serde_json::from_str(raw)?
    } else {
        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("line {}", n + 1))
            })
            .collect::<Result<_>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| to_event(i, value))
        .collect()
}

const FULL_EVENT_KEYS: [&str; 3] = ["id", "agentId", "payload"];

fn to_event(index: usize, value: Value) -> Result<InputEvent> {
    let Value::Object(object) = value else {
        bail!("event {} is not a JSON object", index + 1);
    };
    if FULL_EVENT_KEYS.iter().all(|key| object.contains_key(*key)) {
        return serde_json::from_value(Value::Object(object))
            .with_context(|| format!("event {}", index + 1));
    }
    let id = i64::try_from(index + 1).context("too many events")?;
    Ok(InputEvent::new(
        EventId(id),
        AgentId(0),
        payload_from_value(Value::Object(object))?,
    ))
}
