//! Capture of ERROR-level tracing events for the health check.
//!
//! [`ErrorLogLayer`] is a `tracing_subscriber::Layer` that copies every
//! ERROR event whose target matches a prefix into an [`ErrorLogBuffer`],
//! a bounded ring buffer implementing [`ErrorLog`].

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, RwLock},
};

use {
    chrono::{DateTime, Duration, Utc},
    tracing::{
        Level,
        field::{Field, Visit},
    },
    tracing_subscriber::{Layer, layer::Context},
};

use crate::host::ErrorLog;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub target: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ErrorLogBuffer {
    entries: Arc<RwLock<VecDeque<ErrorEntry>>>,
    capacity: usize,
}

impl Default for ErrorLogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for ErrorLogBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorLogBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ErrorLogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, entry: ErrorEntry) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<ErrorEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl ErrorLog for ErrorLogBuffer {
    fn has_recent_errors(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let cutoff = now.checked_sub_signed(window);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .rev()
            .any(|e| e.at <= now && cutoff.is_none_or(|cutoff| e.at >= cutoff))
    }
}

// ── Layer ───────────────────────────────────────────────────────────────────

pub struct ErrorLogLayer {
    buffer: ErrorLogBuffer,
    target_prefix: String,
}

impl ErrorLogLayer {
    /// Capture ERROR events whose target starts with `target_prefix`
    /// (e.g. `"herald"` for every herald crate).
    pub fn new(buffer: ErrorLogBuffer, target_prefix: impl Into<String>) -> Self {
        Self {
            buffer,
            target_prefix: target_prefix.into(),
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.into();
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorLogLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() != Level::ERROR || !meta.target().starts_with(&self.target_prefix) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.buffer.record(ErrorEntry {
            at: Utc::now(),
            target: meta.target().into(),
            message: visitor.message,
        });
    }
}
