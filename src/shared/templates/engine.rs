use std::collections::BTreeSet;
use std::sync::OnceLock;

use minijinja::{AutoEscape, Environment, Value};
use thiserror::Error;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Templates compiled into the binary, keyed by their path under `templates/`
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[(
    "booking/confirmation.html.jinja",
    include_str!("../../../templates/booking/confirmation.html.jinja"),
)];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn auto_escape(name: &str) -> AutoEscape {
    if name.contains(".html") {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(auto_escape);

    for &(name, source) in EMBEDDED_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        } else {
            tracing::debug!("Loaded template: {}", name);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render one of the embedded templates
pub fn render_template(template_name: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

/// Output of rendering an ad-hoc template source
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSource {
    pub output: String,
    /// Variables the source references that the context did not provide
    pub missing_variables: Vec<String>,
}

/// Render a template source that is not part of the binary (no HTML escaping)
pub fn render_source(source: &str, ctx: Value) -> Result<RenderedSource, TemplateError> {
    let mut env = Environment::new();
    env.add_template("inline", source)
        .map_err(|e| TemplateError::RenderError(e.to_string()))?;

    let template = env
        .get_template("inline")
        .map_err(|_| TemplateError::NotFound("inline".to_string()))?;

    let referenced: BTreeSet<String> = template.undeclared_variables(false).into_iter().collect();
    let missing_variables = referenced
        .into_iter()
        .filter(|name| {
            ctx.get_attr(name)
                .map(|v| v.is_undefined())
                .unwrap_or(true)
        })
        .collect();

    let output = template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))?;

    Ok(RenderedSource {
        output,
        missing_variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_missing_template() {
        let result = render_template("definitely_not_a_real_template.jinja", context! {});
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_render_source_reports_missing_variables() {
        let rendered = render_source(
            "Dear {{ first_name }}, your appointment {{ appointment_id }} is confirmed.",
            context! { first_name => "Ada" },
        )
        .unwrap();

        assert_eq!(
            rendered.output,
            "Dear Ada, your appointment  is confirmed."
        );
        assert_eq!(rendered.missing_variables, vec!["appointment_id".to_string()]);
    }

    #[test]
    fn test_render_source_syntax_error() {
        let result = render_source("{% if %}", context! {});
        assert!(matches!(result, Err(TemplateError::RenderError(_))));
    }
}
