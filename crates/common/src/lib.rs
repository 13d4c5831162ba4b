//! Shared types, error definitions, and utilities used across all herald crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromExternal, Result},
    types::{AgentId, EventId, Payload},
};
