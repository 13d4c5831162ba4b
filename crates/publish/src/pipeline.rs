//! The consume → render → submit → record pipeline.

use std::sync::Arc;

use {
    chrono::Duration,
    herald_common::{AgentId, Payload},
    herald_config::{OutputMode, PublishOptions, is_template_expression, validate_options},
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    admission::admit,
    error::{PostError, TemplateError},
    error_log::ErrorLogBuffer,
    event::{InputEvent, OutcomeEvent, dry_run_payload, failure_payload, success_payload},
    host::{Clock, DryRun, ErrorLog, RunMode, SystemClock},
    poster::{MediaFetcher, PostReceipt, Poster},
    store::{EventSink, EventStore},
    template::{TemplateRenderer, TeraRenderer},
};

const DEFAULT_ERROR_WINDOW_SECS: i64 = 86_400;

/// Where the output mode comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputModeSource {
    Literal(OutputMode),
    Template(String),
}

/// Summary of one `receive` call.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Events that were processed (at most [`crate::MAX_BATCH_SIZE`]).
    pub admitted: usize,
    /// Overflow events discarded without an outcome.
    pub dropped: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Outcomes in input order. Emitted to the sink unless this was a dry run.
    pub outcomes: Vec<OutcomeEvent>,
    pub dry_run: bool,
}

/// Publishes a batch of events and records one outcome per admitted event.
pub struct PublishPipeline {
    pub(crate) agent_id: AgentId,
    options: PublishOptions,
    pub(crate) expected_update_period: Duration,
    output_mode: OutputModeSource,
    ambient: Payload,
    renderer: Arc<dyn TemplateRenderer>,
    poster: Arc<dyn Poster>,
    media: Option<Arc<dyn MediaFetcher>>,
    sink: Arc<dyn EventSink>,
    pub(crate) store: Arc<dyn EventStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) error_log: Arc<dyn ErrorLog>,
    pub(crate) error_window: Duration,
    run_mode: Arc<dyn RunMode>,
}

impl std::fmt::Debug for PublishPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishPipeline")
            .field("agent_id", &self.agent_id)
            .field("options", &self.options)
            .field("output_mode", &self.output_mode)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PublishPipeline`]. `poster` and `store` are required;
/// a media fetcher is required only when `media_url` is configured.
pub struct PipelineBuilder {
    agent_id: AgentId,
    options: PublishOptions,
    ambient: Payload,
    renderer: Arc<dyn TemplateRenderer>,
    poster: Option<Arc<dyn Poster>>,
    media: Option<Arc<dyn MediaFetcher>>,
    sink: Option<Arc<dyn EventSink>>,
    store: Option<Arc<dyn EventStore>>,
    clock: Arc<dyn Clock>,
    error_log: Arc<dyn ErrorLog>,
    error_window: Duration,
    run_mode: Arc<dyn RunMode>,
}

impl PipelineBuilder {
    pub fn poster(mut self, poster: Arc<dyn Poster>) -> Self {
        self.poster = Some(poster);
        self
    }

    pub fn media_fetcher(mut self, media: Arc<dyn MediaFetcher>) -> Self {
        self.media = Some(media);
        self
    }

    /// Use one backend as both the sink and the store the health check reads.
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: EventSink + EventStore + 'static,
    {
        let sink: Arc<dyn EventSink> = store.clone();
        let events: Arc<dyn EventStore> = store;
        self.sink = Some(sink);
        self.store = Some(events);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Process-wide template variables. Event payload keys shadow them.
    pub fn ambient(mut self, ambient: Payload) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn error_log(mut self, error_log: Arc<dyn ErrorLog>) -> Self {
        self.error_log = error_log;
        self
    }

    /// How far back a logged error still makes the unit unhealthy.
    pub fn error_window(mut self, window: Duration) -> Self {
        self.error_window = window;
        self
    }

    pub fn run_mode(mut self, run_mode: Arc<dyn RunMode>) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn dry_run(self, dry_run: bool) -> Self {
        self.run_mode(Arc::new(DryRun(dry_run)))
    }

    /// Validate the options and assemble the pipeline.
    pub fn build(self) -> Result<PublishPipeline> {
        let errors = validate_options(&self.options);
        if !errors.is_empty() {
            return Err(Error::InvalidConfig { errors });
        }
        let Some(expected_update_period) = self.options.expected_update_period() else {
            return Err(Error::message(
                "expected_update_period_in_days did not parse after validation",
            ));
        };

        let poster = self
            .poster
            .ok_or(Error::MissingCollaborator { name: "poster" })?;
        let (Some(sink), Some(store)) = (self.sink, self.store) else {
            return Err(Error::MissingCollaborator {
                name: "event store",
            });
        };
        if self.options.media_url.is_some() && self.media.is_none() {
            return Err(Error::MissingCollaborator {
                name: "media fetcher",
            });
        }

        let output_mode = match self.options.output_mode_source() {
            None => OutputModeSource::Literal(OutputMode::Clean),
            Some(mode) if is_template_expression(mode) => {
                OutputModeSource::Template(mode.to_string())
            },
            Some(mode) => OutputModeSource::Literal(mode.parse().map_err(Error::message)?),
        };

        Ok(PublishPipeline {
            agent_id: self.agent_id,
            options: self.options,
            expected_update_period,
            output_mode,
            ambient: self.ambient,
            renderer: self.renderer,
            poster,
            media: self.media,
            sink,
            store,
            clock: self.clock,
            error_log: self.error_log,
            error_window: self.error_window,
            run_mode: self.run_mode,
        })
    }
}

impl PublishPipeline {
    pub fn builder(agent_id: AgentId, options: PublishOptions) -> PipelineBuilder {
        PipelineBuilder {
            agent_id,
            options,
            ambient: Payload::new(),
            renderer: Arc::new(TeraRenderer),
            poster: None,
            media: None,
            sink: None,
            store: None,
            clock: Arc::new(SystemClock),
            error_log: Arc::new(ErrorLogBuffer::default()),
            error_window: Duration::seconds(DEFAULT_ERROR_WINDOW_SECS),
            run_mode: Arc::new(DryRun(false)),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    /// Process one batch of upstream events.
    ///
    /// At most [`crate::MAX_BATCH_SIZE`] events are processed, in order; the
    /// rest are dropped. Each admitted event yields exactly one outcome, and a
    /// failed post or render never stops later events. Only a sink failure
    /// aborts the batch; outcomes emitted before it stay emitted.
    pub async fn receive(&self, events: Vec<InputEvent>) -> Result<BatchReport> {
        let (admitted, dropped) = admit(events);
        if dropped > 0 {
            warn!(
                agent_id = %self.agent_id,
                admitted = admitted.len(),
                dropped,
                "batch over the size cap, dropping overflow events"
            );
        }

        let dry_run = self.run_mode.is_dry_run();
        let mut report = BatchReport {
            admitted: admitted.len(),
            dropped,
            dry_run,
            ..Default::default()
        };

        for event in &admitted {
            let payload = self.publish_one(event, dry_run).await;
            let outcome = OutcomeEvent {
                agent_id: self.agent_id,
                created_at: self.clock.now(),
                payload,
            };

            if outcome.is_success() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }

            if !dry_run {
                self.sink
                    .emit(&outcome)
                    .await
                    .map_err(|e| Error::sink(event.id, e))?;
            }
            report.outcomes.push(outcome);
        }

        info!(
            agent_id = %self.agent_id,
            admitted = report.admitted,
            succeeded = report.succeeded,
            failed = report.failed,
            dry_run,
            "batch processed"
        );
        Ok(report)
    }

    /// Render, post, and shape the outcome payload for one event.
    async fn publish_one(&self, event: &InputEvent, dry_run: bool) -> Payload {
        let context = self.context_for(event);

        let text = match self.renderer.render(&self.options.message, &context) {
            Ok(text) => text,
            Err(e) => {
                return self.template_failure(event, Payload::new(), &self.options.message, &e);
            },
        };

        let mode = match self.resolve_output_mode(&context) {
            Ok(mode) => mode,
            Err(e) => return self.template_failure(event, Payload::new(), &text, &e),
        };
        let base = match mode {
            OutputMode::Merge => event.payload.clone(),
            OutputMode::Clean => Payload::new(),
        };

        let media_url = match self.render_media_url(&context) {
            Ok(url) => url,
            Err(e) => return self.template_failure(event, base, &text, &e),
        };

        if dry_run {
            info!(
                agent_id = %self.agent_id,
                event_id = %event.id,
                media = media_url.as_deref().unwrap_or(""),
                text = %text,
                "dry run, not posting"
            );
            return dry_run_payload(base, event, &text);
        }

        match self.submit(&text, media_url.as_deref()).await {
            Ok(receipt) => {
                info!(
                    agent_id = %self.agent_id,
                    event_id = %event.id,
                    remote_id = %receipt.id_str,
                    "published"
                );
                success_payload(base, event, &text, &receipt)
            },
            Err(e) => {
                warn!(
                    agent_id = %self.agent_id,
                    event_id = %event.id,
                    error = %e,
                    "publish failed"
                );
                failure_payload(base, event, &text, &e.to_string())
            },
        }
    }

    async fn submit(
        &self,
        text: &str,
        media_url: Option<&str>,
    ) -> std::result::Result<PostReceipt, PostError> {
        let Some(url) = media_url else {
            return self.poster.post(text).await;
        };
        let Some(fetcher) = &self.media else {
            return Err(PostError::media_fetch(url, "no media fetcher configured"));
        };
        let media = fetcher.fetch(url).await?;
        debug!(url, bytes = media.bytes.len(), "fetched media");
        self.poster.post_with_media(text, &media).await
    }

    /// Ambient variables overlaid by the event payload.
    fn context_for(&self, event: &InputEvent) -> Payload {
        let mut context = self.ambient.clone();
        for (key, value) in &event.payload {
            context.insert(key.clone(), value.clone());
        }
        context
    }

    fn resolve_output_mode(
        &self,
        context: &Payload,
    ) -> std::result::Result<OutputMode, TemplateError> {
        match &self.output_mode {
            OutputModeSource::Literal(mode) => Ok(*mode),
            OutputModeSource::Template(template) => {
                let rendered = self.renderer.render(template, context)?;
                match rendered.trim() {
                    "merge" => Ok(OutputMode::Merge),
                    "clean" => Ok(OutputMode::Clean),
                    other => {
                        debug!(
                            rendered = other,
                            "output_mode rendered to neither mode, using clean"
                        );
                        Ok(OutputMode::Clean)
                    },
                }
            },
        }
    }

    /// Rendered media URL, or `None` when unset, blank, or referring to a
    /// field the event does not carry.
    fn render_media_url(
        &self,
        context: &Payload,
    ) -> std::result::Result<Option<String>, TemplateError> {
        let Some(template) = self.options.media_url.as_deref() else {
            return Ok(None);
        };
        let rendered = match self.renderer.render(template, context) {
            Ok(rendered) => rendered,
            Err(e) if e.is_undefined_variable() => {
                debug!(error = %e, "media_url field absent, posting without media");
                return Ok(None);
            },
            Err(e) => return Err(e),
        };
        let trimmed = rendered.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    fn template_failure(
        &self,
        event: &InputEvent,
        base: Payload,
        failed_text: &str,
        err: &TemplateError,
    ) -> Payload {
        error!(
            agent_id = %self.agent_id,
            event_id = %event.id,
            error = %err,
            "failed to render templates for event"
        );
        failure_payload(base, event, failed_text, &err.to_string())
    }
}

