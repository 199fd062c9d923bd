/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template AST types.
//!
//! A parsed template is a list of [`TemplateNode`]s. Delimiter changes are
//! consumed by the parser and never appear here.

use std::borrow::Cow;
use std::fmt;

use crate::config::Tags;

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text to be output as-is.
    Text(TextNode),

    /// Interpolation: `{{name}}`, `{{{name}}}` or `{{&name}}`
    Variable(VariableNode),

    /// Section or inverted section: `{{#name}}...{{/name}}`, `{{^name}}...{{/name}}`
    Section(SectionNode),

    /// Partial inclusion: `{{>name}}`
    Partial(PartialNode),

    /// Comment (not rendered): `{{! comment }}`
    Comment(CommentNode),
}

/// Byte range of a construct in its template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
}

/// A context lookup path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPath {
    /// `.`, the current frame's view itself.
    Implicit,
    /// `a.b.c`, split on dots.
    Keys(Vec<String>),
}

impl KeyPath {
    pub fn parse(name: &str) -> Self {
        if name == "." {
            KeyPath::Implicit
        } else {
            KeyPath::Keys(name.split('.').map(str::to_string).collect())
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPath::Implicit => f.write_str("."),
            KeyPath::Keys(keys) => f.write_str(&keys.join(".")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode {
    pub path: KeyPath,
    /// False for `{{{name}}}` and `{{&name}}`.
    pub escape: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub path: KeyPath,
    /// True for `{{^name}}`.
    pub inverted: bool,
    pub children: Vec<TemplateNode>,
    /// Unparsed source between the open and close tags, handed to section lambdas.
    pub raw: String,
    /// Delimiters in effect at the open tag.
    pub tags: Tags,
    /// From the start of the open tag to the end of the close tag.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartialNode {
    pub name: String,
    pub indent: Indent,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub text: String,
}

/// Indentation applied to every line of a partial's template text.
///
/// A standalone partial tag indents all lines with the whitespace that
/// preceded it. A partial that is the first tag on a line with other content
/// indents only the continuation lines, padding them to the tag's column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Indent {
    pub prefix: String,
    pub first_line: bool,
}

impl Indent {
    pub fn standalone(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            first_line: true,
        }
    }

    /// Indentation for a partial that shares its line with `preceding` text.
    ///
    /// Every character other than a space or tab becomes a space.
    pub fn inline(preceding: &str) -> Self {
        let prefix = preceding
            .chars()
            .filter(|&ch| ch != '\r' && ch != '\n')
            .map(|ch| if ch == '\t' { '\t' } else { ' ' })
            .collect();
        Self {
            prefix,
            first_line: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Prefix the lines of `text`. Empty lines, including the empty tail after
    /// a final newline, are left alone.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.prefix.is_empty() {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + self.prefix.len() * 4);
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if (i > 0 || self.first_line) && !line.is_empty() && line != "\r" {
                out.push_str(&self.prefix);
            }
            out.push_str(line);
        }
        Cow::Owned(out)
    }
}
