//! X/Twitter API client.

use std::time::Duration;

use {
    async_trait::async_trait,
    herald_config::TwitterConfig,
    herald_publish::{MediaContent, PostError, PostReceipt, Poster},
    reqwest::{
        Client, RequestBuilder, Response,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::{debug, instrument},
};

use crate::{
    error::{Error, Result},
    types::{
        ApiErrorBody, CreateTweetRequest, CreateTweetResponse, MediaUploadResponse, TweetMedia,
    },
};

/// Posts tweets with a user access token. One attempt per call.
pub struct TwitterClient {
    client: Client,
    api_url: String,
    upload_url: String,
    access_token: Secret<String>,
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("herald/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Create a tweet, attaching previously uploaded media ids.
    #[instrument(skip(self, text), fields(media = media_ids.len()))]
    pub async fn create_tweet(&self, text: &str, media_ids: Vec<String>) -> Result<PostReceipt> {
        let body = CreateTweetRequest {
            text,
            media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
        };
        let request = self
            .authorized(self.client.post(format!("{}/2/tweets", self.api_url)))
            .json(&body);

        let created: CreateTweetResponse = read_json(request.send().await?).await?;
        let id = created
            .data
            .id
            .parse::<u64>()
            .map_err(|_| Error::message(format!("unexpected tweet id {:?}", created.data.id)))?;
        debug!(id, "tweet created");

        Ok(PostReceipt {
            id,
            id_str: created.data.id,
        })
    }

    /// Upload media bytes and return the media id to attach.
    #[instrument(skip(self, media), fields(bytes = media.bytes.len()))]
    pub async fn upload_media(&self, media: &MediaContent) -> Result<String> {
        let mut part = Part::bytes(media.bytes.clone())
            .file_name(media.file_name.clone().unwrap_or_else(|| "media".into()));
        if let Some(content_type) = &media.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("media", part);

        let request = self
            .authorized(
                self.client
                    .post(format!("{}/1.1/media/upload.json", self.upload_url)),
            )
            .multipart(form);

        let uploaded: MediaUploadResponse = read_json(request.send().await?).await?;
        debug!(media_id = %uploaded.media_id_string, "media uploaded");
        Ok(uploaded.media_id_string)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.access_token.expose_secret())
    }
}

/// Decode a success body, or turn an error body into [`Error::Api`].
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.message())
        .unwrap_or_else(|| format!("HTTP {status}"));
    Err(Error::api(status.as_u16(), message))
}

#[async_trait]
impl Poster for TwitterClient {
    async fn post(&self, text: &str) -> std::result::Result<PostReceipt, PostError> {
        Ok(self.create_tweet(text, Vec::new()).await?)
    }

    async fn post_with_media(
        &self,
        text: &str,
        media: &MediaContent,
    ) -> std::result::Result<PostReceipt, PostError> {
        let media_id = self.upload_media(media).await?;
        Ok(self.create_tweet(text, vec![media_id]).await?)
    }
}
