/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and rendering.
//!
//! Only structural problems are errors. A missing context path, a missing
//! partial, or a lambda returning nothing all render as empty text.

use std::fmt;
use thiserror::Error;

/// A position in template source.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset into the template source.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Compute the line and column of `offset` within `source`.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur during template operations.
///
/// The type is `Clone` because a failed pending value is shared by every
/// node that looked it up, and each of them reports the same failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MustacheError {
    /// The template handed to a render call was not text.
    #[error(
        "Invalid template! Template should be a \"{expected}\" but \"{given}\" was given as the first argument for render(template, view, partials)"
    )]
    InvalidTemplateType { given: String, expected: String },

    /// Malformed tag syntax, e.g. a tag that is never closed.
    #[error("Syntax error at {location}: {message}")]
    Syntax { message: String, location: Location },

    /// A section close tag without a matching open tag, or the reverse.
    #[error("Unbalanced section \"{name}\" at {location}: {message}")]
    UnbalancedSection {
        name: String,
        message: String,
        location: Location,
    },

    /// The producer of a pending value failed.
    #[error("Value resolution failed: {message}")]
    ValueFailed { message: String },
}

impl MustacheError {
    /// Build a [`MustacheError::ValueFailed`] for a pending value producer.
    pub fn value_failed(message: impl Into<String>) -> Self {
        MustacheError::ValueFailed {
            message: message.into(),
        }
    }

    pub(crate) fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        MustacheError::Syntax {
            message: message.into(),
            location: Location::from_offset(source, offset),
        }
    }

    pub(crate) fn unbalanced(
        source: &str,
        offset: usize,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MustacheError::UnbalancedSection {
            name: name.into(),
            message: message.into(),
            location: Location::from_offset(source, offset),
        }
    }
}

/// Result type for template operations.
pub type MustacheResult<T> = Result<T, MustacheError>;
