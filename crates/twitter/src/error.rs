use {herald_publish::PostError, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The API answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unsupported media location {url}: {reason}")]
    UnsupportedUrl { url: String, reason: String },

    #[error("media is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for PostError {
    fn from(err: Error) -> Self {
        match err {
            Error::Api { status, message } => Self::remote(Some(status), message),
            Error::Http(e) => match e.status() {
                Some(status) => Self::remote(Some(status.as_u16()), e.to_string()),
                None => Self::transport(e.to_string()),
            },
            other => Self::transport(other.to_string()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_remote_wording() {
        let post: PostError = Error::api(403, "duplicate content").into();
        assert_eq!(post, PostError::remote(Some(403), "duplicate content"));
        assert_eq!(post.to_string(), "duplicate content");
    }

    #[test]
    fn other_errors_become_transport() {
        let post: PostError = Error::message("bad tweet id").into();
        assert_eq!(post, PostError::transport("bad tweet id"));
    }
}
