/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial template lookup.
//!
//! The engine never loads partials on its own; callers supply a
//! [`PartialResolver`] that maps names to template text. Lookups are
//! synchronous, and a missing partial renders as empty text.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Trait for looking up partial templates by name.
///
/// Implementations decide where partials come from (an in-memory map, a
/// directory, a closure). The renderer calls the resolver once per partial
/// tag it reaches, so lookups should be cheap.
pub trait PartialResolver: Send + Sync {
    /// Look up a partial template by name.
    ///
    /// # Arguments
    /// * `name` - The partial name as written in the tag (e.g., "header")
    ///
    /// # Returns
    /// The partial's template text, or `None` if there is no such partial.
    fn get_partial(&self, name: &str) -> Option<String>;
}

/// Resolver that returns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl PartialResolver for NullResolver {
    fn get_partial(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Resolver that serves partials from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    partials: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partial to the resolver.
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), content.into());
        self
    }

    /// Create a resolver with the given partials.
    pub fn with_partials(
        partials: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, content) in partials {
            resolver.add(name, content);
        }
        resolver
    }
}

impl PartialResolver for MemoryResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.partials.get(name).cloned()
    }
}

impl PartialResolver for HashMap<String, String> {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolver backed by a lookup function.
///
/// The function receives the partial name and returns its template text.
pub struct FnResolver<F>(pub F);

impl<F> PartialResolver for FnResolver<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn get_partial(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }
}

/// The partial source for one render call.
///
/// Cheap to clone; lambdas' sub-renders hold on to it.
#[derive(Clone)]
pub struct Partials(Arc<dyn PartialResolver>);

impl Partials {
    /// Wrap any resolver for use in render calls.
    pub fn new(resolver: impl PartialResolver + 'static) -> Self {
        Self(Arc::new(resolver))
    }

    /// No partials at all.
    pub fn none() -> Self {
        Self::new(NullResolver)
    }

    /// Partials looked up by calling `f`.
    pub fn from_fn(f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self::new(FnResolver(f))
    }

    /// Look up a partial by name.
    ///
    /// # Arguments
    /// * `name` - The partial name as written in the tag
    ///
    /// # Returns
    /// The template text, or `None` when the resolver has no such partial.
    pub fn get(&self, name: &str) -> Option<String> {
        self.0.get_partial(name)
    }
}

impl Default for Partials {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Partials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Partials(..)")
    }
}

impl From<NullResolver> for Partials {
    fn from(resolver: NullResolver) -> Self {
        Self::new(resolver)
    }
}

impl From<MemoryResolver> for Partials {
    fn from(resolver: MemoryResolver) -> Self {
        Self::new(resolver)
    }
}

impl From<HashMap<String, String>> for Partials {
    fn from(map: HashMap<String, String>) -> Self {
        Self::new(map)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Partials {
    fn from(partials: [(&str, &str); N]) -> Self {
        Self::new(MemoryResolver::with_partials(partials))
    }
}

impl<F> From<FnResolver<F>> for Partials
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    fn from(resolver: FnResolver<F>) -> Self {
        Self::new(resolver)
    }
}
