use std::error::Error as StdError;

use {herald_common::EventId, thiserror::Error};

/// Errors that abort a pipeline operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Options failed validation; nothing was processed.
    #[error("invalid configuration: {}", errors.join("; "))]
    InvalidConfig { errors: Vec<String> },

    /// The builder was finished without a required collaborator.
    #[error("pipeline is missing a {name}")]
    MissingCollaborator { name: &'static str },

    /// The downstream sink refused an outcome event.
    #[error("failed to emit outcome for event {event_id}: {source}")]
    Sink {
        event_id: EventId,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn sink(event_id: EventId, source: Error) -> Self {
        Self::Sink {
            event_id,
            source: Box::new(source),
        }
    }
}

impl herald_common::FromExternal for Error {
    fn from_external(context: String, source: Box<dyn StdError + Send + Sync>) -> Self {
        Self::External { context, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

herald_common::impl_context!(Error);

/// Failure reported by the remote posting or media fetch collaborator.
///
/// The `Display` text is what lands in the `error` field of a failure
/// outcome, so it carries the remote service's own wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostError {
    /// The remote service rejected the post (duplicate, auth, rate limit, ...).
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// The request never produced a usable response.
    #[error("{message}")]
    Transport { message: String },

    /// Media could not be retrieved before posting.
    #[error("media fetch failed for {url}: {message}")]
    MediaFetch { url: String, message: String },
}

impl PostError {
    #[must_use]
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn media_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MediaFetch {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Why a template failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateErrorKind {
    /// The template does not parse.
    Syntax,
    /// The template references a variable the context lacks.
    UndefinedVariable,
    /// Any other render failure (bad filter arguments, type errors, ...).
    Render,
}

/// A template could not be rendered against an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template error: {message}")]
pub struct TemplateError {
    pub kind: TemplateErrorKind,
    pub message: String,
}

impl TemplateError {
    #[must_use]
    pub fn new(kind: TemplateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Flatten an error and its source chain into one message.
    #[must_use]
    pub fn from_chain(kind: TemplateErrorKind, err: &(dyn StdError + 'static)) -> Self {
        let mut parts = vec![err.to_string()];
        let mut source = err.source();
        while let Some(inner) = source {
            let text = inner.to_string();
            // Wrappers that already print their source would repeat it.
            if !parts.last().is_some_and(|prev| prev.ends_with(&text)) {
                parts.push(text);
            }
            source = inner.source();
        }
        Self::new(kind, parts.join(": "))
    }

    pub fn is_undefined_variable(&self) -> bool {
        self.kind == TemplateErrorKind::UndefinedVariable
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_bare_message() {
        let err = PostError::remote(Some(403), "duplicate status");
        assert_eq!(err.to_string(), "duplicate status");
    }

    #[test]
    fn media_fetch_error_names_url() {
        let err = PostError::media_fetch("http://x/a.png", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "media fetch failed for http://x/a.png: HTTP 404"
        );
    }

    #[test]
    fn invalid_config_joins_errors() {
        let err = Error::InvalidConfig {
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "invalid configuration: a; b");
    }

    #[test]
    fn template_error_includes_source_chain() {
        let io = std::io::Error::other("inner cause");
        let outer = Error::external("rendering", io);
        let err = TemplateError::from_chain(TemplateErrorKind::Render, &outer);
        assert_eq!(
            err.to_string(),
            "template error: rendering: inner cause"
        );
        assert!(!err.is_undefined_variable());
    }

    #[test]
    fn context_wraps_errors() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = res.context("loading").unwrap_err();
        assert_eq!(err.to_string(), "loading: boom");
        assert!(StdError::source(&err).is_some());
    }
}
