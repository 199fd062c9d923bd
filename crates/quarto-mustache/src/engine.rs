/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The render entry point.
//!
//! A [`Mustache`] owns a template cache and a set of default settings. Each
//! render call snapshots the defaults, applies its own [`RenderOptions`] to
//! the snapshot, and renders. Defaults changed while a render is in flight
//! only affect later calls.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::cache::TemplateCache;
use crate::config::{Config, Escape, RenderOptions, Tags};
use crate::error::{MustacheError, MustacheResult};
use crate::parser::Template;
use crate::renderer::Renderer;
use crate::resolver::Partials;
use crate::value::Value;

/// A template engine instance.
#[derive(Debug, Default)]
pub struct Mustache {
    cache: Arc<TemplateCache>,
    defaults: RwLock<Config>,
}

impl Mustache {
    /// Create an engine with the default delimiters and HTML escaping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given defaults.
    pub fn with_config(config: Config) -> Self {
        Self {
            cache: Arc::new(TemplateCache::new()),
            defaults: RwLock::new(config),
        }
    }

    /// A copy of the current defaults.
    pub fn config(&self) -> Config {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current default delimiters.
    pub fn tags(&self) -> Tags {
        self.config().tags
    }

    /// Replace the default delimiters used by later render calls.
    pub fn set_tags(&self, tags: impl Into<Tags>) {
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .tags = tags.into();
    }

    /// The current default escape function.
    pub fn escape(&self) -> Escape {
        self.config().escape
    }

    /// Replace the default escape function used by later render calls.
    pub fn set_escape(&self, escape: Escape) {
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .escape = escape;
    }

    /// The engine's template cache.
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Parse `template`, or fetch it from the cache.
    ///
    /// `tags` defaults to the engine's current delimiters.
    pub fn parse(&self, template: &str, tags: Option<&Tags>) -> MustacheResult<Arc<Template>> {
        match tags {
            Some(tags) => self.cache.get_or_parse(template, tags),
            None => self.cache.get_or_parse(template, &self.tags()),
        }
    }

    /// Discard all cached templates.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Render `template` against `view`.
    ///
    /// Parse errors are returned before anything is rendered. The returned
    /// future completes once every pending value in the view that the
    /// template touches has settled.
    pub async fn render(
        &self,
        template: &str,
        view: impl Into<Value>,
        partials: impl Into<Partials>,
        options: impl Into<RenderOptions>,
    ) -> MustacheResult<String> {
        let config = self.config().with_options(options.into());
        tracing::debug!(len = template.len(), tags = %config.tags, "Rendering");
        let compiled = self.cache.get_or_parse(template, &config.tags)?;
        let renderer = Renderer::new(Arc::clone(&self.cache), partials.into(), config);
        renderer.render(&compiled, view.into()).await
    }

    /// Render a template given as a dynamic value.
    ///
    /// Fails with [`MustacheError::InvalidTemplateType`] unless `template`
    /// is a string.
    pub async fn render_value(
        &self,
        template: &Value,
        view: impl Into<Value>,
        partials: impl Into<Partials>,
        options: impl Into<RenderOptions>,
    ) -> MustacheResult<String> {
        let Value::String(source) = template else {
            return Err(MustacheError::InvalidTemplateType {
                given: template.type_name().to_string(),
                expected: "string".to_string(),
            });
        };
        self.render(source, view, partials, options).await
    }
}

static GLOBAL: LazyLock<Mustache> = LazyLock::new(Mustache::new);

/// The process-wide engine used by the free functions in this crate.
pub fn global() -> &'static Mustache {
    &GLOBAL
}

/// Render with the process-wide engine.
pub async fn render(
    template: &str,
    view: impl Into<Value>,
    partials: impl Into<Partials>,
    options: impl Into<RenderOptions>,
) -> MustacheResult<String> {
    global().render(template, view, partials, options).await
}

/// Render a dynamically typed template with the process-wide engine.
pub async fn render_value(
    template: &Value,
    view: impl Into<Value>,
    partials: impl Into<Partials>,
    options: impl Into<RenderOptions>,
) -> MustacheResult<String> {
    global()
        .render_value(template, view, partials, options)
        .await
}

/// Parse with the process-wide engine's cache.
pub fn parse(template: &str, tags: Option<&Tags>) -> MustacheResult<Arc<Template>> {
    global().parse(template, tags)
}

/// Clear the process-wide engine's cache.
pub fn clear_cache() {
    global().clear_cache();
}

/// Replace the process-wide engine's default delimiters.
pub fn set_default_tags(tags: impl Into<Tags>) {
    global().set_tags(tags);
}

/// Replace the process-wide engine's default escape function.
pub fn set_default_escape(escape: Escape) {
    global().set_escape(escape);
}
