/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Delimiters, escaping, and per-call render options.
//!
//! [`Config`] holds an engine's defaults. A render call reads them once, then
//! layers any [`RenderOptions`] on top of its own copy. Nothing in the render
//! path writes back to the defaults.

use std::fmt;
use std::sync::Arc;

use crate::error::{MustacheError, MustacheResult};

/// An open/close delimiter pair, `{{`/`}}` by default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tags {
    pub open: String,
    pub close: String,
}

impl Tags {
    /// Create a delimiter pair. Neither side may be empty or contain whitespace.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> MustacheResult<Self> {
        let tags = Self {
            open: open.into(),
            close: close.into(),
        };
        tags.check("")?;
        Ok(tags)
    }

    /// Reject pairs that cannot delimit anything: an empty side never
    /// advances the scanner, and whitespace inside a delimiter cannot be
    /// written in a delimiter-change tag.
    pub(crate) fn check(&self, source: &str) -> MustacheResult<()> {
        let valid = |s: &str| !s.is_empty() && !s.chars().any(char::is_whitespace);
        if valid(&self.open) && valid(&self.close) {
            Ok(())
        } else {
            Err(MustacheError::syntax(
                source,
                0,
                format!("Invalid tags: {:?} {:?}", self.open, self.close),
            ))
        }
    }

    /// Parse the body of a delimiter-change tag, e.g. `=<% %>=`.
    ///
    /// `offset` is where the tag starts in `source`, for error reporting.
    pub(crate) fn from_change_body(body: &str, source: &str, offset: usize) -> MustacheResult<Self> {
        let inner = body
            .trim()
            .strip_prefix('=')
            .and_then(|s| s.strip_suffix('='))
            .ok_or_else(|| MustacheError::syntax(source, offset, "Invalid delimiter change tag"))?;
        let mut parts = inner.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(open), Some(close), None) => Ok(Self {
                open: open.to_string(),
                close: close.to_string(),
            }),
            _ => Err(MustacheError::syntax(
                source,
                offset,
                format!("Invalid tags: {}", inner.trim()),
            )),
        }
    }
}

impl Default for Tags {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

impl From<[&str; 2]> for Tags {
    fn from([open, close]: [&str; 2]) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

impl From<(&str, &str)> for Tags {
    fn from((open, close): (&str, &str)) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

type EscapeFn = dyn Fn(&str) -> String + Send + Sync;

/// The function applied to escaped interpolations.
#[derive(Clone)]
pub struct Escape(Arc<EscapeFn>);

impl Escape {
    /// Wrap a custom escape function.
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// An escape function that returns its input unchanged.
    pub fn none() -> Self {
        Self::new(str::to_string)
    }

    pub fn apply(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl Default for Escape {
    fn default() -> Self {
        Self::new(html_escape)
    }
}

impl fmt::Debug for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Escape(..)")
    }
}

/// Escape `& < > " '` as HTML entities.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Engine-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub tags: Tags,
    pub escape: Escape,
}

impl Config {
    /// Layer call-scoped overrides on top of a copy of these defaults.
    pub fn with_options(&self, options: RenderOptions) -> Config {
        Config {
            tags: options.tags.unwrap_or_else(|| self.tags.clone()),
            escape: options.escape.unwrap_or_else(|| self.escape.clone()),
        }
    }
}

/// Overrides for a single render call.
///
/// A bare delimiter pair converts into options that only override the tags.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub tags: Option<Tags>,
    pub escape: Option<Escape>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the delimiter pair.
    pub fn with_tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Override the escape function.
    pub fn with_escape(mut self, escape: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.escape = Some(Escape::new(escape));
        self
    }
}

impl From<Tags> for RenderOptions {
    fn from(tags: Tags) -> Self {
        Self::new().with_tags(tags)
    }
}

impl From<[&str; 2]> for RenderOptions {
    fn from(tags: [&str; 2]) -> Self {
        Self::new().with_tags(tags)
    }
}

impl From<(&str, &str)> for RenderOptions {
    fn from(tags: (&str, &str)) -> Self {
        Self::new().with_tags(tags)
    }
}

impl From<Escape> for RenderOptions {
    fn from(escape: Escape) -> Self {
        Self {
            tags: None,
            escape: Some(escape),
        }
    }
}
