//! Event publish pipeline.
//!
//! Consumes a bounded batch of upstream events, renders a message from each
//! event's payload, submits it to a posting service, and records exactly one
//! outcome event per admitted input.

pub mod admission;
pub mod error;
pub mod error_log;
pub mod event;
pub mod health;
pub mod host;
pub mod pipeline;
pub mod poster;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod template;

pub use {
    admission::{MAX_BATCH_SIZE, admit},
    error::{Error, PostError, Result, TemplateError, TemplateErrorKind},
    error_log::{ErrorLogBuffer, ErrorLogLayer},
    event::{InputEvent, OutcomeEvent, StoredOutcome},
    health::HealthReport,
    host::{Clock, DryRun, ErrorLog, ManualClock, RunMode, SystemClock},
    pipeline::{BatchReport, PipelineBuilder, PublishPipeline},
    poster::{MediaContent, MediaFetcher, PostReceipt, Poster},
    store::{EventSink, EventStore},
    store_file::FileStore,
    store_memory::InMemoryStore,
    template::{TemplateRenderer, TeraRenderer},
};
