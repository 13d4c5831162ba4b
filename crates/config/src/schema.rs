/// Config schema types (publish options, posting API, event store, health).
use std::{fmt, path::PathBuf, str::FromStr};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Deserializer, Serialize},
};

/// Message template used when none is configured.
pub const DEFAULT_MESSAGE: &str = "{{text}}";

const DEFAULT_EXPECTED_UPDATE_PERIOD_DAYS: &str = "10";

const MS_PER_DAY: f64 = 86_400_000.0;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Identity this unit stamps on the events it creates.
    pub agent_id: i64,
    pub publish: PublishOptions,
    pub twitter: TwitterConfig,
    pub store: StoreConfig,
    pub health: HealthConfig,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            agent_id: 1,
            publish: PublishOptions::default(),
            twitter: TwitterConfig::default(),
            store: StoreConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

// ── Publish options ─────────────────────────────────────────────────────────

/// Whether an outcome payload starts empty or as a copy of the input payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Clean,
    Merge,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clean" => Ok(Self::Clean),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown output mode: {other}")),
        }
    }
}

/// Options for the publish pipeline.
///
/// Every string except `expected_update_period_in_days` may be a template;
/// `output_mode` is either a literal mode or a template that renders to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Maximum number of days expected between outcome events.
    /// Accepts a number or a numeric string. Absent means "not configured".
    #[serde(
        default,
        deserialize_with = "deserialize_period",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_update_period_in_days: Option<String>,

    /// Template for the published text.
    pub message: String,

    /// Template that renders to a media URL. Blank output means no media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,

    /// `clean`, `merge`, or a template expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_mode: Option<String>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            expected_update_period_in_days: Some(DEFAULT_EXPECTED_UPDATE_PERIOD_DAYS.into()),
            message: DEFAULT_MESSAGE.into(),
            media_url: None,
            output_mode: Some(OutputMode::Clean.as_str().into()),
        }
    }
}

impl PublishOptions {
    /// Parsed freshness window, or `None` when absent, unparsable, or not positive.
    pub fn expected_update_period(&self) -> Option<chrono::Duration> {
        let days: f64 = self
            .expected_update_period_in_days
            .as_deref()?
            .trim()
            .parse()
            .ok()?;
        if !days.is_finite() || days <= 0.0 {
            return None;
        }
        // `as` saturates, so huge periods clamp to the longest representable span.
        let millis = (days * MS_PER_DAY) as i64;
        Some(chrono::Duration::try_milliseconds(millis).unwrap_or(chrono::Duration::MAX))
    }

    /// Configured output mode with blank values treated as absent. Anything
    /// else is returned untouched: a literal must match a mode exactly.
    pub fn output_mode_source(&self) -> Option<&str> {
        self.output_mode
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// True when `value` contains a template marker and must be rendered per event.
pub fn is_template_expression(value: &str) -> bool {
    value.contains('{')
}

fn deserialize_period<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(
        Option::<NumberOrString>::deserialize(deserializer)?.map(|v| match v {
            NumberOrString::Int(n) => n.to_string(),
            NumberOrString::Float(n) => n.to_string(),
            NumberOrString::Text(s) => s,
        }),
    )
}

// ── Posting API ─────────────────────────────────────────────────────────────

/// Credentials and endpoints for the X/Twitter posting API.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    /// OAuth 2.0 user access token with `tweet.write` scope.
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,

    /// Base URL of the v2 API.
    pub api_url: String,

    /// Base URL of the v1.1 media upload API.
    pub upload_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("access_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            access_token: Secret::new(String::new()),
            api_url: "https://api.twitter.com".into(),
            upload_url: "https://upload.twitter.com".into(),
            timeout_secs: 30,
        }
    }
}

impl TwitterConfig {
    pub fn has_token(&self) -> bool {
        !self.access_token.expose_secret().trim().is_empty()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

// ── Event store / health ────────────────────────────────────────────────────

/// Where outcome events are persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSONL file for outcome events. Defaults to `<data_dir>/events.jsonl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Health check tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// How far back a logged error still counts against health.
    pub error_window_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            error_window_secs: 86_400,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn defaults_match_agent_defaults() {
        let opts = PublishOptions::default();
        assert_eq!(opts.expected_update_period_in_days.as_deref(), Some("10"));
        assert_eq!(opts.message, "{{text}}");
        assert_eq!(opts.output_mode.as_deref(), Some("clean"));
        assert!(opts.media_url.is_none());
    }

    #[test]
    fn missing_period_stays_absent() {
        let opts: PublishOptions = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(opts.expected_update_period_in_days.is_none());
        assert_eq!(opts.message, "hi");
    }

    #[rstest]
    #[case(r#"{"expected_update_period_in_days": "10"}"#, "10")]
    #[case(r#"{"expected_update_period_in_days": 3}"#, "3")]
    #[case(r#"{"expected_update_period_in_days": 0.5}"#, "0.5")]
    fn period_accepts_numbers_and_strings(#[case] json: &str, #[case] expected: &str) {
        let opts: PublishOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.expected_update_period_in_days.as_deref(), Some(expected));
    }

    #[rstest]
    #[case(Some("10"), Some(chrono::Duration::days(10)))]
    #[case(Some("0.5"), Some(chrono::Duration::hours(12)))]
    #[case(Some(" 2 "), Some(chrono::Duration::days(2)))]
    #[case(Some("1000000000"), Some(chrono::Duration::days(1_000_000_000)))]
    #[case(Some("1e300"), Some(chrono::Duration::MAX))]
    #[case(Some("0"), None)]
    #[case(Some("-1"), None)]
    #[case(Some("soon"), None)]
    #[case(None, None)]
    fn expected_update_period_parsing(
        #[case] raw: Option<&str>,
        #[case] expected: Option<chrono::Duration>,
    ) {
        let opts = PublishOptions {
            expected_update_period_in_days: raw.map(String::from),
            ..Default::default()
        };
        assert_eq!(opts.expected_update_period(), expected);
    }

    #[test]
    fn output_mode_parses_literals_only() {
        assert_eq!("merge".parse::<OutputMode>().unwrap(), OutputMode::Merge);
        assert_eq!("clean".parse::<OutputMode>().unwrap(), OutputMode::Clean);
        assert!("Merge".parse::<OutputMode>().is_err());
    }

    #[test]
    fn template_marker_detection() {
        assert!(is_template_expression("{{ mode }}"));
        assert!(!is_template_expression("merge"));
    }

    #[test]
    fn twitter_config_debug_redacts_token() {
        let cfg = TwitterConfig {
            access_token: Secret::new("very-secret".into()),
            ..Default::default()
        };
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("very-secret"));
        assert!(cfg.has_token());
        assert!(!TwitterConfig::default().has_token());
    }
}
