use std::error::Error as StdError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Context ─────────────────────────────────────────────────────────────────

/// Error types that can wrap a foreign error under a context string.
pub trait FromExternal: Sized {
    fn from_external(context: String, source: Box<dyn StdError + Send + Sync>) -> Self;
}

/// Generate a crate-local `Context` trait that converts any foreign error
/// into `$error` via [`FromExternal`], keeping it as the `source`.
///
/// ```ignore
/// // in crates/publish/src/error.rs
/// herald_common::impl_context!(Error);
/// ```
#[macro_export]
macro_rules! impl_context {
    ($error:ty) => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> std::result::Result<T, $error>;

            fn with_context<C, F>(self, f: F) -> std::result::Result<T, $error>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E> Context<T> for std::result::Result<T, E>
        where
            E: std::error::Error + Send + Sync + 'static,
        {
            fn context(self, context: impl Into<String>) -> std::result::Result<T, $error> {
                self.map_err(|source| {
                    <$error as $crate::FromExternal>::from_external(
                        context.into(),
                        Box::new(source),
                    )
                })
            }

            fn with_context<C, F>(self, f: F) -> std::result::Result<T, $error>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    <$error as $crate::FromExternal>::from_external(f().into(), Box::new(source))
                })
            }
        }
    };
}
