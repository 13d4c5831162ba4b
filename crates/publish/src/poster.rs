//! Remote posting and media fetch seams.

use async_trait::async_trait;

use crate::error::PostError;

/// Identifier the remote service assigned to a published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub id: u64,
    pub id_str: String,
}

impl PostReceipt {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            id_str: id.to_string(),
        }
    }
}

/// Media bytes retrieved for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaContent {
    pub bytes: Vec<u8>,
    /// MIME type when the source reported one.
    pub content_type: Option<String>,
    /// Last path segment of the source URL, used as the upload file name.
    pub file_name: Option<String>,
}

/// Publishes text (optionally with media) to the remote service.
#[async_trait]
pub trait Poster: Send + Sync {
    async fn post(&self, text: &str) -> Result<PostReceipt, PostError>;

    async fn post_with_media(
        &self,
        text: &str,
        media: &MediaContent,
    ) -> Result<PostReceipt, PostError>;
}

/// Dereferences a media URL into bytes.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<MediaContent, PostError>;
}
