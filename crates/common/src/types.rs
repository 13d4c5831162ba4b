//! Event identity and dynamic payload types.
//!
//! Upstream events carry arbitrary JSON shapes, so payloads are an ordered
//! string-keyed map of JSON values rather than a fixed schema. Key order is
//! kept (serde_json `preserve_order`) so merged payloads read like the input.

use std::fmt;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::{Error, Result};

/// Key/value body of an event.
pub type Payload = serde_json::Map<String, Value>;

/// Identifier of the agent that created an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub i64);

/// Identifier of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AgentId> for Value {
    fn from(id: AgentId) -> Self {
        Value::from(id.0)
    }
}

impl From<EventId> for Value {
    fn from(id: EventId) -> Self {
        Value::from(id.0)
    }
}

/// Convert a JSON value into a payload, rejecting anything that is not an object.
pub fn payload_from_value(value: Value) -> Result<Payload> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::NotAnObject {
            kind: value_kind(&other),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn payload_keeps_insertion_order() {
        let payload = payload_from_value(json!({"z": 1, "a": 2, "m": 3})).unwrap();
        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn non_object_rejected() {
        let err = payload_from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "expected a JSON object, got array");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_value(AgentId(7)).unwrap(), json!(7));
        assert_eq!(Value::from(EventId(9)), json!(9));
        assert_eq!(EventId(9).to_string(), "9");
    }
}
