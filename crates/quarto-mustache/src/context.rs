/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The context stack.
//!
//! Each frame holds one view and a link to the frame that encloses it. Frames
//! are immutable and reference counted, so a render can hand the current
//! stack to a lambda (or to concurrently resolving siblings) without copying.

use std::sync::Arc;

use crate::ast::KeyPath;
use crate::error::MustacheResult;
use crate::value::Value;

/// A context frame for template rendering.
#[derive(Debug)]
pub struct Context {
    /// The view at this level. Never pending.
    view: Value,

    /// Enclosing frame (e.g. outside the current section).
    parent: Option<Arc<Context>>,
}

impl Context {
    /// Create a root frame. `view` should already be settled.
    pub fn new(view: Value) -> Arc<Self> {
        Arc::new(Self { view, parent: None })
    }

    /// Push a frame for `view` on top of this one.
    pub fn push(self: &Arc<Self>, view: Value) -> Arc<Context> {
        Arc::new(Context {
            view,
            parent: Some(Arc::clone(self)),
        })
    }

    /// Get the view at this level.
    pub fn view(&self) -> &Value {
        &self.view
    }

    /// Get the enclosing frame, if any.
    pub fn parent(&self) -> Option<&Arc<Context>> {
        self.parent.as_ref()
    }

    /// Find the nearest frame whose view defines `key`.
    ///
    /// The first frame that has the key wins, even when its value is falsy.
    fn find(&self, key: &str) -> Option<&Value> {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if let Some(value) = current.view.get(key) {
                return Some(value);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    /// Resolve `path` against this stack.
    ///
    /// The first key walks outward through enclosing frames; the remaining
    /// keys are looked up strictly inside the value the first key found.
    /// Pending values met along the way are awaited. `Ok(None)` means no
    /// frame defines the path, which renders like a falsy value.
    pub async fn lookup(&self, path: &KeyPath) -> MustacheResult<Option<Value>> {
        let keys = match path {
            KeyPath::Implicit => return Ok(Some(self.view.clone())),
            KeyPath::Keys(keys) => keys,
        };
        let Some((first, rest)) = keys.split_first() else {
            return Ok(None);
        };
        let Some(found) = self.find(first) else {
            return Ok(None);
        };

        let mut value = found.clone().settle().await?;
        for key in rest {
            value = match value.get(key) {
                Some(next) => next.clone().settle().await?,
                None => return Ok(None),
            };
        }
        Ok(Some(value))
    }
}
