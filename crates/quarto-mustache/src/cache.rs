/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed template cache.
//!
//! Templates are keyed by their source text and the delimiters they were
//! parsed with. Entries live until [`TemplateCache::clear`]; there is no
//! eviction.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::config::Tags;
use crate::error::MustacheResult;
use crate::parser::Template;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    tags: Tags,
}

#[derive(Debug)]
struct CacheEntry {
    template: Arc<Template>,
    created_at: Instant,
}

/// Memoizes compiled templates across render calls.
///
/// Safe to share between concurrent renders. Two renders racing on the same
/// uncached source may both parse it; the first insert wins and both get
/// that template back.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached template for `(source, tags)`, parsing it on a miss.
    pub fn get_or_parse(&self, source: &str, tags: &Tags) -> MustacheResult<Arc<Template>> {
        let key = CacheKey {
            source: source.to_string(),
            tags: tags.clone(),
        };

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                tracing::trace!(len = source.len(), tags = %tags, "Template cache hit");
                return Ok(Arc::clone(&entry.template));
            }
        }

        // Parse without holding the lock; parse errors are not cached.
        tracing::debug!(len = source.len(), tags = %tags, "Parsing template");
        let template = Arc::new(Template::compile_with_tags(source, tags)?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(key).or_insert_with(|| CacheEntry {
            template,
            created_at: Instant::now(),
        });
        Ok(Arc::clone(&entry.template))
    }

    /// When the entry for `(source, tags)` was created, if it is cached.
    pub fn created_at(&self, source: &str, tags: &Tags) -> Option<Instant> {
        let key = CacheKey {
            source: source.to_string(),
            tags: tags.clone(),
        };
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).map(|entry| entry.created_at)
    }

    /// Discard every cached template.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(count = entries.len(), "Clearing template cache");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
