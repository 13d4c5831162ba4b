//! Template rendering seam and the tera-backed implementation.

use {herald_common::Payload, serde_json::Value, tera::Tera};

use crate::error::{TemplateError, TemplateErrorKind};

const INLINE: &str = "__inline";

/// Interpolates a template string against an event context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Payload) -> Result<String, TemplateError>;
}

/// Tera-backed renderer. Templates are compiled per call with autoescaping
/// off since output is plain text, not HTML.
///
/// Tera is strict: referencing a variable the context lacks is an error,
/// reported as [`TemplateErrorKind::UndefinedVariable`] so callers can decide
/// whether a missing field matters. Optional fields can also use `default`,
/// e.g. `{{ image | default(value="") }}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraRenderer;

impl TeraRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &Payload) -> Result<String, TemplateError> {
        // Plain strings never need the engine.
        if !template.contains('{') {
            return Ok(template.to_string());
        }
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(INLINE, template)
            .map_err(|e| TemplateError::from_chain(TemplateErrorKind::Syntax, &e))?;
        let ctx = tera::Context::from_value(Value::Object(context.clone()))
            .map_err(|e| TemplateError::from_chain(TemplateErrorKind::Render, &e))?;
        tera.render(INLINE, &ctx).map_err(|e| {
            let kind = if mentions_missing_variable(&e) {
                TemplateErrorKind::UndefinedVariable
            } else {
                TemplateErrorKind::Render
            };
            TemplateError::from_chain(kind, &e)
        })
    }
}

/// Tera reports undefined variables as a plain message somewhere in the chain.
fn mentions_missing_variable(err: &tera::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.to_string().contains("not found in context") {
            return true;
        }
        current = e.source();
    }
    false
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn ctx(value: Value) -> Payload {
        herald_common::types::payload_from_value(value).unwrap()
    }

    #[test]
    fn renders_bare_placeholder() {
        let out = TeraRenderer
            .render("{{text}}", &ctx(json!({"text": "hello"})))
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn renders_nested_fields_and_filters() {
        let out = TeraRenderer
            .render(
                "{{ title | upper }} {{ link.url }}",
                &ctx(json!({"title": "news", "link": {"url": "https://e.x/1"}})),
            )
            .unwrap();
        assert_eq!(out, "NEWS https://e.x/1");
    }

    #[test]
    fn does_not_escape_html() {
        let out = TeraRenderer
            .render("{{ text }}", &ctx(json!({"text": "a & <b>"})))
            .unwrap();
        assert_eq!(out, "a & <b>");
    }

    #[test]
    fn literal_passes_through() {
        let out = TeraRenderer.render("merge", &Payload::new()).unwrap();
        assert_eq!(out, "merge");
    }

    #[test]
    fn missing_variable_is_an_error() {
        let err = TeraRenderer
            .render("{{ missing }}", &Payload::new())
            .unwrap_err();
        assert!(err.message.contains("missing"), "{}", err.message);
        assert_eq!(err.kind, TemplateErrorKind::UndefinedVariable);
    }

    #[test]
    fn missing_nested_field_is_undefined() {
        let err = TeraRenderer
            .render("{{ link.url }}", &ctx(json!({"text": "x"})))
            .unwrap_err();
        assert!(err.is_undefined_variable(), "{}", err.message);
    }

    #[test]
    fn default_filter_covers_missing_variable() {
        let out = TeraRenderer
            .render("{{ image | default(value=\"\") }}", &Payload::new())
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn syntax_error_is_an_error() {
        let err = TeraRenderer
            .render("{{ unclosed", &Payload::new())
            .unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::Syntax);
    }

    #[test]
    fn bad_filter_is_not_undefined() {
        let err = TeraRenderer
            .render("{{ text | no_such_filter }}", &ctx(json!({"text": "x"})))
            .unwrap_err();
        assert!(!err.is_undefined_variable(), "{}", err.message);
    }
}
