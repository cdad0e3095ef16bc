//! Template engine seam and template loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use minijinja::{AutoEscape, Environment, ErrorKind};
use serde_json::Value;

/// Named template sources, keyed by file name without extension.
pub type Templates = BTreeMap<String, String>;

/// Errors produced while rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown partial: {0}")]
    UnknownPartial(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to build view: {0}")]
    View(#[from] serde_json::Error),
}

/// Renders a template source against a view.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with `view` as context. `partials` are available
    /// to the template by name.
    fn render(
        &self,
        template: &str,
        view: &Value,
        partials: &Templates,
    ) -> Result<String, RenderError>;
}

/// Template engine using minijinja.
///
/// Partials are registered as named templates and pulled in with
/// `{% include "name" %}`. Output is never auto-escaped: page content is
/// already HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct JinjaEngine;

impl JinjaEngine {
    pub fn new() -> Self {
        Self
    }

    fn environment(partials: &Templates) -> Result<Environment<'static>, RenderError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        for (name, source) in partials {
            env.add_template_owned(name.clone(), source.clone())
                .map_err(|e| RenderError::Template(format!("partial '{}': {:#}", name, e)))?;
        }

        Ok(env)
    }
}

impl TemplateEngine for JinjaEngine {
    fn render(
        &self,
        template: &str,
        view: &Value,
        partials: &Templates,
    ) -> Result<String, RenderError> {
        let env = Self::environment(partials)?;

        env.render_str(template, view).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::UnknownPartial(format!("{:#}", e)),
            _ => RenderError::Template(format!("{:#}", e)),
        })
    }
}

/// Read every file in `dir` into a name -> source map.
///
/// A missing directory yields an empty map.
pub fn load_templates(dir: &Path) -> std::io::Result<Templates> {
    let mut templates = Templates::new();

    if !dir.is_dir() {
        return Ok(templates);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        templates.insert(name.to_string(), fs::read_to_string(&path)?);
    }

    tracing::debug!("Loaded {} templates from {}", templates.len(), dir.display());

    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn renders_view_values() {
        let html = JinjaEngine::new()
            .render(
                "<title>{{ page.title }} - {{ site.title }}</title>",
                &json!({ "page": { "title": "Button" }, "site": { "title": "My Docs" } }),
                &Templates::new(),
            )
            .unwrap();

        assert_eq!(html, "<title>Button - My Docs</title>");
    }

    #[test]
    fn does_not_escape_content() {
        let html = JinjaEngine::new()
            .render(
                "<main>{{ page.content }}</main>",
                &json!({ "page": { "content": "<p>Hello world</p>" } }),
                &Templates::new(),
            )
            .unwrap();

        assert_eq!(html, "<main><p>Hello world</p></main>");
    }

    #[test]
    fn includes_partials() {
        let mut partials = Templates::new();
        partials.insert("nav".to_string(), "<nav>{{ site.title }}</nav>".to_string());

        let html = JinjaEngine::new()
            .render(
                r#"{% include "nav" %}<p>body</p>"#,
                &json!({ "site": { "title": "Docs" } }),
                &partials,
            )
            .unwrap();

        assert_eq!(html, "<nav>Docs</nav><p>body</p>");
    }

    #[test]
    fn unknown_partial_is_an_error() {
        let result = JinjaEngine::new().render(
            r#"{% include "missing" %}"#,
            &json!({}),
            &Templates::new(),
        );

        assert!(matches!(result, Err(RenderError::UnknownPartial(_))));
    }

    #[test]
    fn undefined_values_render_empty() {
        let html = JinjaEngine::new()
            .render("[{{ nothing }}]", &json!({}), &Templates::new())
            .unwrap();

        assert_eq!(html, "[]");
    }

    #[test]
    fn loads_templates_by_stem() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("post.html"), "<article></article>").unwrap();
        fs::write(temp.path().join("page.html"), "<main></main>").unwrap();

        let templates = load_templates(temp.path()).unwrap();

        assert_eq!(templates.len(), 2);
        assert_eq!(templates["post"], "<article></article>");
    }

    #[test]
    fn missing_template_dir_is_empty() {
        let temp = tempdir().unwrap();

        let templates = load_templates(&temp.path().join("_layouts")).unwrap();

        assert!(templates.is_empty());
    }
}
