//! Theme engine with Tera templates and suggestion resolution.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tera::Tera;
use tracing::debug;

use crate::routes::helpers::html_escape;

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Self::configure(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Create a theme engine from in-memory templates (for testing).
    pub fn from_raw(templates: &[(&str, &str)]) -> Result<Self> {
        let mut tera = Tera::default();
        Self::configure(&mut tera);
        tera.add_raw_templates(templates.iter().copied())
            .context("failed to add raw templates")?;

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Apply kernel-wide Tera settings.
    fn configure(tera: &mut Tera) {
        // Paths in href/action attributes keep their slashes
        tera.set_escape_fn(html_escape);
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    ///
    /// Example suggestions: `["content/landing--services", "content/landing"]`
    pub fn resolve_template(&self, suggestions: &[String]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }
        }

        None
    }

    /// Template suggestions for a content page, most specific first.
    ///
    /// `content_suggestions("landing", "services")` yields
    /// `content/landing--services` then `content/landing`.
    pub fn content_suggestions(page: &str, type_slug: &str) -> Vec<String> {
        vec![
            format!("content/{page}--{type_slug}"),
            format!("content/{page}"),
        ]
    }

    /// Render a named template.
    pub fn render(&self, template: &str, context: &tera::Context) -> tera::Result<String> {
        self.tera.render(template, context)
    }

    /// Render the first existing template among `suggestions`.
    pub fn render_suggested(
        &self,
        suggestions: &[String],
        context: &tera::Context,
    ) -> tera::Result<String> {
        let template = self.resolve_template(suggestions).ok_or_else(|| {
            tera::Error::template_not_found(suggestions.last().cloned().unwrap_or_default())
        })?;
        self.tera.render(&template, context)
    }
}

/// Wrap ThemeEngine in Arc for sharing across handlers.
pub type SharedThemeEngine = Arc<ThemeEngine>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_suggestions() {
        assert_eq!(
            ThemeEngine::content_suggestions("landing", "services"),
            vec!["content/landing--services", "content/landing"]
        );
    }

    #[test]
    fn test_resolve_prefers_specific_template() {
        let theme = ThemeEngine::from_raw(&[
            ("content/add.html", "generic"),
            ("content/add--events.html", "events"),
        ])
        .unwrap();

        let events = ThemeEngine::content_suggestions("add", "events");
        let services = ThemeEngine::content_suggestions("add", "services");
        assert_eq!(
            theme.resolve_template(&events).as_deref(),
            Some("content/add--events.html")
        );
        assert_eq!(
            theme.resolve_template(&services).as_deref(),
            Some("content/add.html")
        );

        let ctx = tera::Context::new();
        assert_eq!(theme.render_suggested(&events, &ctx).unwrap(), "events");
    }

    #[test]
    fn test_missing_suggestions_fail_render() {
        let theme = ThemeEngine::from_raw(&[]).unwrap();
        let suggestions = ThemeEngine::content_suggestions("home", "x");
        assert!(theme.resolve_template(&suggestions).is_none());
        assert!(
            theme
                .render_suggested(&suggestions, &tera::Context::new())
                .is_err()
        );
    }

    #[test]
    fn test_autoescape_keeps_slashes() {
        let theme = ThemeEngine::from_raw(&[("t.html", r#"<a href="{{ path }}">{{ label }}</a>"#)])
            .unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("path", "/content/services");
        ctx.insert("label", "<b>Services</b>");
        assert_eq!(
            theme.render("t.html", &ctx).unwrap(),
            r#"<a href="/content/services">&lt;b&gt;Services&lt;/b&gt;</a>"#
        );
    }
}
