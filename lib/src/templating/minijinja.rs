use std::path::Path;

use minijinja::{path_loader, Environment};
use serde::Serialize;

use crate::error::{Chainable, Result};

/// Renders named templates from a template directory. Templates ending in
/// `.html` are auto-escaped; trusted HTML goes through the `safe` filter.
#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new(templates: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(templates));
        MiniJinjaEngine { env }
    }

    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String> {
        let template = self.env.get_template(name)
            .chain_with(|| error!("failed to load template", "template" => name))?;

        template.render(context)
            .chain_with(|| error!("failed to render template", "template" => name))
    }
}

impl_error_detail_with_std_error!(minijinja::Error);

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;

    #[test]
    fn renders_with_inheritance_and_escaping() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.html"), "<title>{{ title }}</title>{% block body %}{% endblock %}").unwrap();
        fs::write(dir.path().join("page.html"), concat!(
            "{% extends \"base.html\" %}{% block body %}",
            "{{ content_html|safe }}|{{ raw }}",
            "{% endblock %}",
        )).unwrap();

        let engine = MiniJinjaEngine::new(dir.path());
        let html = engine.render("page.html", json!({
            "title": "Fish & Chips",
            "content_html": "<p>ok</p>",
            "raw": "<b>",
        })).unwrap();

        assert_eq!(html, "<title>Fish &amp; Chips</title><p>ok</p>|&lt;b&gt;");
    }

    #[test]
    fn missing_templates_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let error = MiniJinjaEngine::new(dir.path()).render("nope.html", ()).unwrap_err();
        assert!(error.to_string().contains("template: nope.html"));
    }
}
