//! Wire types for the tweets and media upload endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /2/tweets`.
#[derive(Debug, Serialize)]
pub struct CreateTweetRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<TweetMedia>,
}

#[derive(Debug, Serialize)]
pub struct TweetMedia {
    pub media_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTweetResponse {
    pub data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// Response of `POST /1.1/media/upload.json`.
#[derive(Debug, Deserialize)]
pub struct MediaUploadResponse {
    pub media_id_string: String,
}

/// Error body shared by the v2 (problem JSON) and v1.1 (`errors` list) APIs.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorItem {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Most specific human-readable message in the body.
    pub fn message(&self) -> Option<String> {
        if let Some(detail) = self.detail.as_deref().filter(|d| !d.trim().is_empty()) {
            return Some(detail.to_string());
        }
        let listed: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.message.as_deref())
            .filter(|m| !m.trim().is_empty())
            .collect();
        if !listed.is_empty() {
            return Some(listed.join("; "));
        }
        self.title.clone().filter(|t| !t.trim().is_empty())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn body(value: serde_json::Value) -> ApiErrorBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn detail_wins_over_title() {
        let b = body(json!({
            "title": "Forbidden",
            "detail": "You are not allowed to create a Tweet with duplicate content.",
            "type": "about:blank",
            "status": 403
        }));
        assert_eq!(
            b.message().unwrap(),
            "You are not allowed to create a Tweet with duplicate content."
        );
    }

    #[test]
    fn legacy_error_list_is_joined() {
        let b = body(json!({"errors": [
            {"code": 187, "message": "Status is a duplicate."},
            {"code": 88, "message": "Rate limit exceeded"}
        ]}));
        assert_eq!(
            b.message().unwrap(),
            "Status is a duplicate.; Rate limit exceeded"
        );
    }

    #[test]
    fn empty_body_has_no_message() {
        assert!(body(json!({})).message().is_none());
    }

    #[test]
    fn media_is_omitted_when_absent() {
        let req = CreateTweetRequest {
            text: "hi",
            media: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"text": "hi"}));
    }
}
