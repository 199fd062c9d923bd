/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parser.
//!
//! Consumes the token stream one source line at a time. Tags and text runs
//! are buffered until the line terminator (or end of input) is seen, so the
//! standalone-tag rule can be decided with the whole line in view:
//!
//! - a section, inverted section, close, partial, comment, or delimiter-change
//!   tag that is the only non-whitespace content of its line is standalone;
//! - a standalone tag's surrounding whitespace and line terminator are dropped;
//! - a standalone partial keeps the leading whitespace as its [`Indent`].
//!
//! Once a line is decided it is flushed into the tree, opening and closing
//! sections on an explicit stack.

use crate::ast::{
    CommentNode, Indent, KeyPath, PartialNode, SectionNode, Span, TemplateNode, TextNode,
    VariableNode,
};
use crate::config::Tags;
use crate::error::{MustacheError, MustacheResult};
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// A compiled template ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub(crate) nodes: Vec<TemplateNode>,
    pub(crate) source: String,
    pub(crate) tags: Tags,
}

impl Template {
    /// Compile a template using the default `{{ }}` delimiters.
    pub fn compile(source: &str) -> MustacheResult<Self> {
        Self::compile_with_tags(source, &Tags::default())
    }

    /// Compile a template starting with the given delimiters.
    pub fn compile_with_tags(source: &str, tags: &Tags) -> MustacheResult<Self> {
        let nodes = parse(source, Tokenizer::new(source, tags.clone()), tags)?;
        Ok(Template {
            nodes,
            source: source.to_string(),
            tags: tags.clone(),
        })
    }

    /// Get the AST nodes of this template.
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The delimiters the template was compiled with.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

/// What a tag asks for, decided by its first non-whitespace character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// No sigil: escaped interpolation.
    Escaped,
    /// `&`
    Ampersand,
    /// `{`
    Triple,
    /// `#`
    Section,
    /// `^`
    Inverted,
    /// `/`
    Close,
    /// `>`
    Partial,
    /// `!`
    Comment,
    /// `=`
    Delimiters,
}

impl Sigil {
    fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '&' => Sigil::Ampersand,
            '{' => Sigil::Triple,
            '#' => Sigil::Section,
            '^' => Sigil::Inverted,
            '/' => Sigil::Close,
            '>' => Sigil::Partial,
            '!' => Sigil::Comment,
            '=' => Sigil::Delimiters,
            _ => return None,
        })
    }

    /// Whether a tag of this kind can stand alone on a line.
    pub fn can_stand_alone(self) -> bool {
        !matches!(self, Sigil::Escaped | Sigil::Ampersand | Sigil::Triple)
    }
}

/// A tag body split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub sigil: Sigil,
    /// The name with surrounding whitespace removed.
    pub name: &'a str,
    pub leading_whitespace: &'a str,
    pub trailing_whitespace: &'a str,
}

impl<'a> Tag<'a> {
    pub fn parse(body: &'a str) -> Self {
        let trimmed = body.trim_start();
        let (sigil, rest) = match trimmed.chars().next().and_then(Sigil::from_char) {
            Some(sigil) => (sigil, &trimmed[1..]),
            None => (Sigil::Escaped, trimmed),
        };
        let rest = if sigil == Sigil::Delimiters {
            rest.strip_suffix('=').unwrap_or(rest)
        } else {
            rest
        };
        let name = rest.trim();
        let leading_len = rest.len() - rest.trim_start().len();
        let trailing_len = rest.len() - rest.trim_end().len();
        Tag {
            sigil,
            name,
            leading_whitespace: &rest[..leading_len],
            trailing_whitespace: &rest[rest.len() - trailing_len..],
        }
    }
}

/// A tag waiting for its line to be decided.
#[derive(Debug)]
struct LineTag<'a> {
    tag: Tag<'a>,
    span: Span,
    /// Delimiters in effect at this tag (before any change it makes).
    tags: Tags,
}

#[derive(Debug)]
enum LineItem<'a> {
    Text(&'a str),
    Tag(LineTag<'a>),
}

#[derive(Debug)]
struct OpenSection {
    name: String,
    inverted: bool,
    children: Vec<TemplateNode>,
    /// Offset just past the open tag.
    body_start: usize,
    start: usize,
    tags: Tags,
}

struct Parser<'a> {
    source: &'a str,
    tags: Tags,
    line: Vec<LineItem<'a>>,
    root: Vec<TemplateNode>,
    sections: Vec<OpenSection>,
}

/// Parse a token stream over `source` into a node list.
///
/// `tags` must be the delimiters the token stream started with.
pub fn parse<'a>(
    source: &'a str,
    tokens: impl IntoIterator<Item = MustacheResult<Token<'a>>>,
    tags: &Tags,
) -> MustacheResult<Vec<TemplateNode>> {
    let mut parser = Parser {
        source,
        tags: tags.clone(),
        line: Vec::new(),
        root: Vec::new(),
        sections: Vec::new(),
    };

    let mut open_at: Option<usize> = None;
    let mut body: Option<Token<'a>> = None;

    for token in tokens {
        let token = token?;
        match token.kind {
            TokenKind::Text => parser.push_text(token.raw)?,
            TokenKind::TagOpen => open_at = Some(token.start),
            TokenKind::TagBody | TokenKind::TagDelimiterChange => body = Some(token),
            TokenKind::TagClose => {
                let (Some(start), Some(body)) = (open_at.take(), body.take()) else {
                    return Err(MustacheError::syntax(source, token.start, "Malformed tag"));
                };
                let tag = Tag::parse(body.raw);
                parser.line.push(LineItem::Tag(LineTag {
                    tag,
                    span: Span {
                        start,
                        end: token.end,
                    },
                    tags: parser.tags.clone(),
                }));
                if body.kind == TokenKind::TagDelimiterChange {
                    parser.tags = Tags::from_change_body(body.raw, source, start)?;
                }
            }
        }
    }
    if let Some(start) = open_at {
        return Err(MustacheError::syntax(source, start, "Unclosed tag"));
    }

    parser.end_line(None)?;
    parser.finish()
}

impl<'a> Parser<'a> {
    fn push_text(&mut self, text: &'a str) -> MustacheResult<()> {
        let mut rest = text;
        while let Some(i) = rest.find('\n') {
            let (content, terminator) = if rest[..i].ends_with('\r') {
                (&rest[..i - 1], &rest[i - 1..=i])
            } else {
                (&rest[..i], &rest[i..=i])
            };
            if !content.is_empty() {
                self.line.push(LineItem::Text(content));
            }
            self.end_line(Some(terminator))?;
            rest = &rest[i + 1..];
        }
        if !rest.is_empty() {
            self.line.push(LineItem::Text(rest));
        }
        Ok(())
    }

    fn is_standalone(line: &[LineItem<'_>]) -> bool {
        let mut tags = 0;
        for item in line {
            match item {
                LineItem::Text(text) => {
                    if !text.chars().all(|ch| ch == ' ' || ch == '\t') {
                        return false;
                    }
                }
                LineItem::Tag(line_tag) => {
                    if !line_tag.tag.sigil.can_stand_alone() {
                        return false;
                    }
                    tags += 1;
                }
            }
        }
        tags == 1
    }

    fn end_line(&mut self, terminator: Option<&'a str>) -> MustacheResult<()> {
        let line = std::mem::take(&mut self.line);

        if Self::is_standalone(&line) {
            let mut leading = String::new();
            for item in line {
                match item {
                    LineItem::Text(text) => leading.push_str(text),
                    LineItem::Tag(line_tag) => {
                        self.emit_tag(line_tag, Indent::standalone(leading))?;
                        break;
                    }
                }
            }
            return Ok(());
        }

        let mut preceding = String::new();
        let mut tag_index = 0;
        for item in line {
            match item {
                LineItem::Text(text) => {
                    preceding.push_str(text);
                    self.emit_text(text);
                }
                LineItem::Tag(line_tag) => {
                    let indent = if tag_index == 0 {
                        Indent::inline(&preceding)
                    } else {
                        Indent::default()
                    };
                    tag_index += 1;
                    self.emit_tag(line_tag, indent)?;
                }
            }
        }
        if let Some(terminator) = terminator {
            self.emit_text(terminator);
        }
        Ok(())
    }

    fn children(&mut self) -> &mut Vec<TemplateNode> {
        match self.sections.last_mut() {
            Some(section) => &mut section.children,
            None => &mut self.root,
        }
    }

    fn emit_text(&mut self, text: &str) {
        let children = self.children();
        if let Some(TemplateNode::Text(last)) = children.last_mut() {
            last.text.push_str(text);
        } else {
            children.push(TemplateNode::Text(TextNode {
                text: text.to_string(),
            }));
        }
    }

    fn emit_tag(&mut self, line_tag: LineTag<'a>, indent: Indent) -> MustacheResult<()> {
        let LineTag { tag, span, tags } = line_tag;
        match tag.sigil {
            Sigil::Escaped | Sigil::Ampersand | Sigil::Triple => {
                let node = TemplateNode::Variable(VariableNode {
                    path: KeyPath::parse(tag.name),
                    escape: tag.sigil == Sigil::Escaped,
                    span,
                });
                self.children().push(node);
            }
            Sigil::Section | Sigil::Inverted => {
                self.sections.push(OpenSection {
                    name: tag.name.to_string(),
                    inverted: tag.sigil == Sigil::Inverted,
                    children: Vec::new(),
                    body_start: span.end,
                    start: span.start,
                    tags,
                });
            }
            Sigil::Close => {
                let Some(open) = self.sections.pop() else {
                    return Err(MustacheError::unbalanced(
                        self.source,
                        span.start,
                        tag.name,
                        "Unopened section",
                    ));
                };
                if open.name != tag.name {
                    return Err(MustacheError::unbalanced(
                        self.source,
                        open.start,
                        open.name.as_str(),
                        format!("Unclosed section, found closing tag \"{}\"", tag.name),
                    ));
                }
                let node = TemplateNode::Section(SectionNode {
                    path: KeyPath::parse(&open.name),
                    inverted: open.inverted,
                    children: open.children,
                    raw: self.source[open.body_start..span.start].to_string(),
                    tags: open.tags,
                    span: Span {
                        start: open.start,
                        end: span.end,
                    },
                });
                self.children().push(node);
            }
            Sigil::Partial => {
                let node = TemplateNode::Partial(PartialNode {
                    name: tag.name.to_string(),
                    indent,
                    span,
                });
                self.children().push(node);
            }
            Sigil::Comment => {
                let node = TemplateNode::Comment(CommentNode {
                    text: tag.name.to_string(),
                });
                self.children().push(node);
            }
            // Already applied to the token stream.
            Sigil::Delimiters => {}
        }
        Ok(())
    }

    fn finish(mut self) -> MustacheResult<Vec<TemplateNode>> {
        if let Some(open) = self.sections.pop() {
            return Err(MustacheError::unbalanced(
                self.source,
                open.start,
                open.name,
                "Unclosed section",
            ));
        }
        Ok(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Template {
        Template::compile(source).expect("template should parse")
    }

    fn text(s: &str) -> TemplateNode {
        TemplateNode::Text(TextNode {
            text: s.to_string(),
        })
    }

    #[test]
    fn test_tag_parse_sigils() {
        let tag = Tag::parse(" #items ");
        assert_eq!(tag.sigil, Sigil::Section);
        assert_eq!(tag.name, "items");
        assert_eq!(tag.leading_whitespace, "");
        assert_eq!(tag.trailing_whitespace, " ");

        assert_eq!(Tag::parse("> partial ").sigil, Sigil::Partial);
        assert_eq!(Tag::parse("> partial ").leading_whitespace, " ");
        assert_eq!(Tag::parse("{html").sigil, Sigil::Triple);
        assert_eq!(Tag::parse("{html").name, "html");
        assert_eq!(Tag::parse("& raw").sigil, Sigil::Ampersand);
        assert_eq!(Tag::parse("name").sigil, Sigil::Escaped);
        assert_eq!(Tag::parse("=<% %>=").sigil, Sigil::Delimiters);
        assert_eq!(Tag::parse("=<% %>=").name, "<% %>");
    }

    #[test]
    fn test_literal_only() {
        let template = compile("Hello, world!");
        assert_eq!(template.nodes(), &[text("Hello, world!")]);
    }

    #[test]
    fn test_variable_escape_flags() {
        let template = compile("{{a}}{{{b}}}{{&c}}");
        let flags: Vec<bool> = template
            .nodes()
            .iter()
            .map(|n| match n {
                TemplateNode::Variable(v) => v.escape,
                other => panic!("unexpected node {other:?}"),
            })
            .collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_section_raw_text_and_children() {
        let template = compile("{{#list}}<{{.}}>{{/list}}");
        let TemplateNode::Section(section) = &template.nodes()[0] else {
            panic!("expected section");
        };
        assert_eq!(section.path, KeyPath::parse("list"));
        assert!(!section.inverted);
        assert_eq!(section.raw, "<{{.}}>");
        assert_eq!(section.children.len(), 3);
        assert_eq!(section.span, Span { start: 0, end: 25 });
    }

    #[test]
    fn test_standalone_section_lines_removed() {
        let template = compile("a\n  {{#s}}\nb\n  {{/s}}\nc\n");
        assert_eq!(template.nodes().len(), 3);
        assert_eq!(template.nodes()[0], text("a\n"));
        let TemplateNode::Section(section) = &template.nodes()[1] else {
            panic!("expected section");
        };
        assert_eq!(section.children, vec![text("b\n")]);
        assert_eq!(section.raw, "\nb\n  ");
        assert_eq!(template.nodes()[2], text("c\n"));
    }

    #[test]
    fn test_crlf_standalone() {
        let template = compile("|\r\n{{!comment}}\r\n|");
        let rendered: String = template
            .nodes()
            .iter()
            .filter_map(|n| match n {
                TemplateNode::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(rendered, "|\r\n|");
    }

    #[test]
    fn test_variable_is_never_standalone() {
        let template = compile("  {{x}}\n");
        assert_eq!(template.nodes().len(), 3);
        assert_eq!(template.nodes()[2], text("\n"));
    }

    #[test]
    fn test_two_tags_on_a_line_are_not_standalone() {
        let template = compile("{{!a}}{{!b}}\nx");
        assert_eq!(template.nodes().last(), Some(&text("\nx")));
    }

    #[test]
    fn test_standalone_partial_records_indent() {
        let template = compile("\\\n {{>partial}}\n/\n");
        let TemplateNode::Partial(partial) = &template.nodes()[1] else {
            panic!("expected partial");
        };
        assert_eq!(partial.name, "partial");
        assert_eq!(partial.indent, Indent::standalone(" "));
        assert_eq!(template.nodes()[2], text("/\n"));
    }

    #[test]
    fn test_standalone_on_first_and_last_line() {
        let template = compile("  {{>p}}\n>");
        assert_eq!(template.nodes().len(), 2);
        let template = compile(">\n  {{>p}}");
        assert_eq!(template.nodes().len(), 2);
        let TemplateNode::Partial(partial) = &template.nodes()[1] else {
            panic!("expected partial");
        };
        assert_eq!(partial.indent, Indent::standalone("  "));
    }

    #[test]
    fn test_inline_partial_indent_only_for_first_tag() {
        let template = compile("  {{data}}  {{> partial}}\n");
        let TemplateNode::Partial(partial) = &template.nodes()[3] else {
            panic!("expected partial");
        };
        assert!(partial.indent.is_empty());

        let template = compile("    <div>{{> partial}}</div>");
        let TemplateNode::Partial(partial) = &template.nodes()[1] else {
            panic!("expected partial");
        };
        assert_eq!(partial.indent, Indent::inline("    <div>"));
    }

    #[test]
    fn test_delimiter_change_is_not_emitted() {
        let template = compile("{{=<% %>=}}\n<%name%>");
        assert_eq!(template.nodes().len(), 1);
        assert!(matches!(template.nodes()[0], TemplateNode::Variable(_)));
    }

    #[test]
    fn test_section_records_tags_at_open() {
        let template = compile("{{=[ ]=}}[#s][x][/s]");
        let TemplateNode::Section(section) = &template.nodes()[0] else {
            panic!("expected section");
        };
        assert_eq!(section.tags, Tags::from(["[", "]"]));
        assert_eq!(section.raw, "[x]");
    }

    #[test]
    fn test_comment_node_retained() {
        let template = compile("a{{! note }}b");
        assert_eq!(
            template.nodes()[1],
            TemplateNode::Comment(CommentNode {
                text: "note".to_string()
            })
        );
    }

    #[test]
    fn test_unopened_section() {
        let err = Template::compile("{{/a}}").unwrap_err();
        assert!(matches!(err, MustacheError::UnbalancedSection { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_mismatched_section() {
        let err = Template::compile("{{#a}}{{/b}}").unwrap_err();
        assert!(matches!(err, MustacheError::UnbalancedSection { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_unclosed_section() {
        let err = Template::compile("{{#a}}text").unwrap_err();
        match err {
            MustacheError::UnbalancedSection { name, message, .. } => {
                assert_eq!(name, "a");
                assert_eq!(message, "Unclosed section");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_tag() {
        let err = Template::compile("text {{ name").unwrap_err();
        assert!(matches!(err, MustacheError::Syntax { .. }));
    }

    #[test]
    fn test_custom_initial_tags() {
        let template = Template::compile_with_tags("<<x>>{{y}}", &Tags::from(["<<", ">>"])).unwrap();
        assert_eq!(template.nodes().len(), 2);
        assert_eq!(template.nodes()[1], text("{{y}}"));
        assert_eq!(template.tags(), &Tags::from(["<<", ">>"]));
    }
}
