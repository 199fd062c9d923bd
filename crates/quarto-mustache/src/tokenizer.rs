/*
 * tokenizer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template tokenizer.
//!
//! Splits template text into text runs and tags. Every tag is emitted as
//! three tokens: [`TokenKind::TagOpen`], a body ([`TokenKind::TagBody`] or
//! [`TokenKind::TagDelimiterChange`]), and [`TokenKind::TagClose`].
//!
//! Delimiters are matched literally. The only tag body the tokenizer looks
//! inside is a delimiter change (`=<% %>=`), because the pair it installs
//! governs where the next tag starts. Sigil dispatch is left to the parser.

use crate::config::Tags;
use crate::error::{MustacheError, MustacheResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text between tags.
    Text,
    /// The open delimiter of a tag.
    TagOpen,
    /// Everything between the delimiters of an ordinary tag.
    TagBody,
    /// The body of a `=<open> <close>=` tag.
    TagDelimiterChange,
    /// The close delimiter of a tag, including the extra `}` of `{{{name}}}`.
    TagClose,
}

/// A slice of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub raw: &'a str,
    /// Byte offset of the first byte of `raw`.
    pub start: usize,
    /// Byte offset one past the last byte of `raw`.
    pub end: usize,
    /// True when the token starts at the beginning of a source line.
    pub line_start: bool,
}

#[derive(Debug)]
enum State {
    Text,
    Body,
    Close { len: usize, next_tags: Option<Tags> },
    Done,
}

/// Single-pass token stream over a template.
///
/// Yields `Err` at most once, after which the stream ends.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    source: &'a str,
    tags: Tags,
    pos: usize,
    state: State,
}

/// Tokenize `source`, starting with the `tags` delimiter pair.
pub fn tokenize<'a>(source: &'a str, tags: &Tags) -> Tokenizer<'a> {
    Tokenizer::new(source, tags.clone())
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, tags: Tags) -> Self {
        Self {
            source,
            tags,
            pos: 0,
            state: State::Text,
        }
    }

    /// The delimiter pair currently used for scanning.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        Token {
            kind,
            raw: &self.source[start..end],
            start,
            end,
            line_start: start == 0 || self.source[..start].ends_with('\n'),
        }
    }

    fn scan_text(&mut self) -> Option<Token<'a>> {
        let start = self.pos;
        if start >= self.source.len() {
            return None;
        }
        match self.source[start..].find(self.tags.open.as_str()) {
            Some(0) => {
                self.pos += self.tags.open.len();
                self.state = State::Body;
                Some(self.token(TokenKind::TagOpen, start, self.pos))
            }
            Some(i) => {
                self.pos += i;
                self.state = State::Text;
                Some(self.token(TokenKind::Text, start, self.pos))
            }
            None => {
                self.pos = self.source.len();
                Some(self.token(TokenKind::Text, start, self.pos))
            }
        }
    }

    fn scan_body(&mut self) -> MustacheResult<Token<'a>> {
        let start = self.pos;
        let tag_start = start - self.tags.open.len();
        let rest = &self.source[start..];
        let trimmed = rest.trim_start();
        let lead = rest.len() - trimmed.len();

        // The three body shapes differ only in what terminates them.
        // `(kind, terminator, search_from, kept)`: `kept` is how many bytes of
        // the terminator belong to the body rather than to the close token.
        let (kind, terminator, search_from, kept) = if trimmed.starts_with('=') {
            let terminator = format!("={}", self.tags.close);
            (TokenKind::TagDelimiterChange, terminator, lead + 1, 1)
        } else if trimmed.starts_with('{') {
            let terminator = format!("}}{}", self.tags.close);
            (TokenKind::TagBody, terminator, lead + 1, 0)
        } else {
            (TokenKind::TagBody, self.tags.close.clone(), 0, 0)
        };

        let Some(i) = rest[search_from..].find(terminator.as_str()) else {
            return Err(MustacheError::syntax(self.source, tag_start, "Unclosed tag"));
        };

        let body_end = start + search_from + i + kept;
        let token = self.token(kind, start, body_end);
        let next_tags = if kind == TokenKind::TagDelimiterChange {
            Some(Tags::from_change_body(token.raw, self.source, tag_start)?)
        } else {
            None
        };
        self.pos = body_end;
        self.state = State::Close {
            len: terminator.len() - kept,
            next_tags,
        };
        Ok(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = MustacheResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Text => {
                if let Err(err) = self.tags.check(self.source) {
                    return Some(Err(err));
                }
                self.scan_text().map(Ok)
            }
            State::Body => Some(self.scan_body()),
            State::Close { len, next_tags } => {
                let start = self.pos;
                self.pos += len;
                if let Some(tags) = next_tags {
                    self.tags = tags;
                }
                self.state = State::Text;
                Some(Ok(self.token(TokenKind::TagClose, start, self.pos)))
            }
        }
    }
}
