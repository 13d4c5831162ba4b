//! Media retrieval for `media_url`.
//!
//! `http(s)://` URLs are fetched with reqwest; `file://` URLs and bare
//! paths are read from disk. Anything over [`MAX_MEDIA_BYTES`] is refused.

use std::{path::Path, time::Duration};

use {
    async_trait::async_trait,
    herald_publish::{MediaContent, MediaFetcher, PostError},
    reqwest::{Client, header::CONTENT_TYPE},
    tokio::fs,
    tracing::debug,
    url::Url,
};

use crate::error::{Error, Result};

/// Upload limit for images on the media endpoint.
pub const MAX_MEDIA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpMediaFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("herald/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_bytes: MAX_MEDIA_BYTES,
        })
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn load(&self, location: &str) -> Result<MediaContent> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.download(url).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|()| Error::UnsupportedUrl {
                    url: location.into(),
                    reason: "not a local file path".into(),
                })?;
                self.read_file(&path).await
            },
            Ok(url) => Err(Error::UnsupportedUrl {
                url: location.into(),
                reason: format!("scheme '{}' is not supported", url.scheme()),
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.read_file(Path::new(location)).await
            },
            Err(e) => Err(Error::UnsupportedUrl {
                url: location.into(),
                reason: e.to_string(),
            }),
        }
    }

    async fn download(&self, url: Url) -> Result<MediaContent> {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), format!("HTTP {status}")));
        }
        if let Some(size) = response.content_length()
            && size > self.max_bytes
        {
            return Err(self.too_large(size));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > self.max_bytes {
                return Err(self.too_large(bytes.len() as u64));
            }
        }
        debug!(bytes = bytes.len(), content_type = ?content_type, "downloaded media");

        Ok(MediaContent {
            bytes,
            content_type,
            file_name,
        })
    }

    async fn read_file(&self, path: &Path) -> Result<MediaContent> {
        let size = fs::metadata(path).await?.len();
        if size > self.max_bytes {
            return Err(self.too_large(size));
        }
        let bytes = fs::read(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "read media file");

        Ok(MediaContent {
            bytes,
            content_type: content_type_for(path).map(str::to_string),
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        })
    }

    fn too_large(&self, size: u64) -> Error {
        Error::TooLarge {
            size,
            limit: self.max_bytes,
        }
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<MediaContent, PostError> {
        self.load(url)
            .await
            .map_err(|e| PostError::media_fetch(url, e.to_string()))
    }
}
