/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Logic-less Mustache templates for Quarto.
//!
//! This crate renders [Mustache](https://mustache.github.io/mustache.5.html)
//! templates against a dynamic view. It supports:
//!
//! - Escaped and raw interpolation: `{{name}}`, `{{{name}}}`, `{{&name}}`
//! - Dotted names and the implicit iterator: `{{a.b.c}}`, `{{.}}`
//! - Sections and inverted sections: `{{#list}}...{{/list}}`, `{{^x}}...{{/x}}`
//! - Partials with standalone indentation: `{{>header}}`
//! - Delimiter changes: `{{=<% %>=}}`
//! - Comments: `{{! ignored }}`
//! - Lambdas in variable and section position
//!
//! # Asynchronous values
//!
//! Any value in the view may be a [`PendingValue`]. Rendering is a future
//! that completes once every pending value the template reaches has settled.
//! Sibling nodes wait independently, and the output keeps document order.
//!
//! # Example
//!
//! ```ignore
//! use quarto_mustache::{Partials, RenderOptions, Value};
//!
//! let view = Value::map([("name", "World")]);
//! let output = quarto_mustache::render(
//!     "Hello, {{name}}!",
//!     view,
//!     Partials::none(),
//!     RenderOptions::new(),
//! )
//! .await?;
//! assert_eq!(output, "Hello, World!");
//! ```

pub mod ast;
pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod resolver;
pub mod tokenizer;
pub mod value;

// Re-export main types at crate root
pub use ast::{
    CommentNode, Indent, KeyPath, PartialNode, SectionNode, Span, TemplateNode, TextNode,
    VariableNode,
};
pub use cache::TemplateCache;
pub use config::{Config, Escape, RenderOptions, Tags, html_escape};
pub use context::Context;
pub use engine::{
    Mustache, clear_cache, global, parse, render, render_value, set_default_escape,
    set_default_tags,
};
pub use error::{Location, MustacheError, MustacheResult};
pub use parser::Template;
pub use renderer::SubRender;
pub use resolver::{FnResolver, MemoryResolver, NullResolver, PartialResolver, Partials};
pub use tokenizer::{Token, TokenKind, Tokenizer, tokenize};
pub use value::{Lambda, PendingValue, Value};
