//! Configuration validation.
//!
//! [`validate_options`] is the gate the publish pipeline applies before any
//! run. [`validate_config`] wraps it with file-level diagnostics for the CLI.

use std::fmt;

use crate::schema::{HeraldConfig, OutputMode, PublishOptions, is_template_expression};

pub const ERR_PERIOD_REQUIRED: &str = "expected_update_period_in_days is required";
pub const ERR_PERIOD_NOT_POSITIVE: &str = "expected_update_period_in_days must be a positive number";
pub const ERR_OUTPUT_MODE: &str = "if provided, output_mode must be 'clean' or 'merge'";

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "publish.output_mode"
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.path, self.message)
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate publish options. An empty result means the options are usable.
pub fn validate_options(options: &PublishOptions) -> Vec<String> {
    let mut errors = Vec::new();

    match options
        .expected_update_period_in_days
        .as_deref()
        .map(str::trim)
    {
        None | Some("") => errors.push(ERR_PERIOD_REQUIRED.to_string()),
        Some(_) if options.expected_update_period().is_none() => {
            errors.push(ERR_PERIOD_NOT_POSITIVE.to_string());
        },
        Some(_) => {},
    }

    if let Some(mode) = options.output_mode_source()
        && !is_template_expression(mode)
        && mode.parse::<OutputMode>().is_err()
    {
        errors.push(ERR_OUTPUT_MODE.to_string());
    }

    errors
}

/// Validate a whole configuration file.
pub fn validate_config(config: &HeraldConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    for error in validate_options(&config.publish) {
        let path = if error == ERR_OUTPUT_MODE {
            "publish.output_mode"
        } else {
            "publish.expected_update_period_in_days"
        };
        result.push(Severity::Error, path, error);
    }

    if config.publish.message.trim().is_empty() {
        result.push(
            Severity::Warning,
            "publish.message",
            "message template is empty; every post will be blank",
        );
    }

    if !config.twitter.has_token() {
        result.push(
            Severity::Warning,
            "twitter.access_token",
            "no access token configured; posts will be rejected",
        );
    }

    for (path, url) in [
        ("twitter.api_url", &config.twitter.api_url),
        ("twitter.upload_url", &config.twitter.upload_url),
    ] {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            result.push(Severity::Error, path, format!("not an http(s) URL: {url}"));
        }
    }

    if config.twitter.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "twitter.timeout_secs",
            "timeout must be greater than zero",
        );
    }

    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, secrecy::Secret};

    fn options(period: Option<&str>, mode: Option<&str>) -> PublishOptions {
        PublishOptions {
            expected_update_period_in_days: period.map(String::from),
            output_mode: mode.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_options(&PublishOptions::default()).is_empty());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn missing_period_is_required(#[case] period: Option<&str>) {
        assert_eq!(validate_options(&options(period, None)), vec![
            ERR_PERIOD_REQUIRED.to_string()
        ]);
    }

    #[rstest]
    #[case("0")]
    #[case("-3")]
    #[case("ten")]
    fn non_positive_period_rejected(#[case] period: &str) {
        assert_eq!(validate_options(&options(Some(period), None)), vec![
            ERR_PERIOD_NOT_POSITIVE.to_string()
        ]);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("clean"))]
    #[case(Some("merge"))]
    #[case(Some("{{ mode }}"))]
    #[case(Some("{% if a %}merge{% else %}clean{% endif %}"))]
    fn accepted_output_modes(#[case] mode: Option<&str>) {
        assert!(validate_options(&options(Some("10"), mode)).is_empty());
    }

    #[rstest]
    #[case("bogus")]
    #[case("Merge")]
    #[case("clean merge")]
    #[case(" merge ")]
    #[case("clean\n")]
    fn literal_output_mode_must_be_known(#[case] mode: &str) {
        assert_eq!(validate_options(&options(Some("10"), Some(mode))), vec![
            ERR_OUTPUT_MODE.to_string()
        ]);
    }

    #[test]
    fn both_errors_reported_together() {
        let errors = validate_options(&options(None, Some("bogus")));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn config_diagnostics_carry_paths() {
        let mut config = HeraldConfig::default();
        config.publish.output_mode = Some("bogus".into());
        config.twitter.access_token = Secret::new("tok".into());

        let result = validate_config(&config);
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.diagnostics[0].path, "publish.output_mode");
    }

    #[test]
    fn missing_token_is_only_a_warning() {
        let result = validate_config(&HeraldConfig::default());
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn non_http_api_url_is_an_error() {
        let mut config = HeraldConfig::default();
        config.twitter.api_url = "ftp://example.com".into();
        let result = validate_config(&config);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "twitter.api_url" && d.severity == Severity::Error)
        );
    }
}
