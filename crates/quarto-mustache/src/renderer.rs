/*
 * renderer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template rendering.
//!
//! Walks a parsed template against a context stack. Every node renders to
//! its own future, and sibling futures are joined with
//! [`try_join_all`], so a node waiting on a pending value does not hold up
//! its siblings while the output still comes out in document order. The
//! first failure aborts the whole render.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};

use crate::ast::{PartialNode, SectionNode, TemplateNode, TextNode, VariableNode};
use crate::cache::TemplateCache;
use crate::config::{Config, Escape, Tags};
use crate::context::Context;
use crate::error::MustacheResult;
use crate::parser::Template;
use crate::resolver::Partials;
use crate::value::{Lambda, Value};

/// Everything one render call needs besides the template and view.
///
/// Cloned into [`SubRender`] handles, so lambdas can render text long after
/// the borrow of the initial call has ended.
#[derive(Debug, Clone)]
pub(crate) struct Renderer {
    cache: Arc<TemplateCache>,
    partials: Partials,
    escape: Escape,
    /// The call's delimiters, used for partials and variable lambdas.
    tags: Tags,
}

impl Renderer {
    pub(crate) fn new(cache: Arc<TemplateCache>, partials: Partials, config: Config) -> Self {
        Self {
            cache,
            partials,
            escape: config.escape,
            tags: config.tags,
        }
    }

    /// Render `template` with `view` as the root frame.
    pub(crate) async fn render(&self, template: &Template, view: Value) -> MustacheResult<String> {
        tracing::trace!(nodes = template.nodes().len(), "Rendering template");
        let view = view.settle().await?;
        let root = Context::new(view);
        self.render_nodes(template.nodes(), &root).await
    }

    fn render_nodes<'a>(
        &'a self,
        nodes: &'a [TemplateNode],
        context: &'a Arc<Context>,
    ) -> BoxFuture<'a, MustacheResult<String>> {
        async move {
            let parts =
                try_join_all(nodes.iter().map(|node| self.render_node(node, context))).await?;
            Ok(parts.concat())
        }
        .boxed()
    }

    async fn render_node(
        &self,
        node: &TemplateNode,
        context: &Arc<Context>,
    ) -> MustacheResult<String> {
        match node {
            TemplateNode::Text(TextNode { text }) => Ok(text.clone()),
            TemplateNode::Variable(var) => self.render_variable(var, context).await,
            TemplateNode::Section(section) => self.render_section(section, context).await,
            TemplateNode::Partial(partial) => self.render_partial(partial, context).await,
            TemplateNode::Comment(_) => Ok(String::new()),
        }
    }

    /// Parse `source` with `tags` and render it against `context`.
    async fn render_source(
        &self,
        source: &str,
        tags: &Tags,
        context: &Arc<Context>,
    ) -> MustacheResult<String> {
        let template = self.cache.get_or_parse(source, tags)?;
        self.render_nodes(template.nodes(), context).await
    }

    async fn render_variable(
        &self,
        var: &VariableNode,
        context: &Arc<Context>,
    ) -> MustacheResult<String> {
        let text = match context.lookup(&var.path).await? {
            None | Some(Value::Null) => return Ok(String::new()),
            Some(Value::Lambda(Lambda::Variable(f))) => {
                let source = f().settle().await?;
                if matches!(source, Value::Null) {
                    return Ok(String::new());
                }
                self.render_source(&source.to_output_string(), &self.tags, context)
                    .await?
            }
            Some(Value::Lambda(Lambda::Section(_))) => return Ok(String::new()),
            Some(value) => value.settle_deep().await?.to_output_string(),
        };
        Ok(if var.escape {
            self.escape.apply(&text)
        } else {
            text
        })
    }

    async fn render_section(
        &self,
        section: &SectionNode,
        context: &Arc<Context>,
    ) -> MustacheResult<String> {
        let value = match context.lookup(&section.path).await? {
            Some(Value::Lambda(Lambda::Variable(f))) => Some(f().settle().await?),
            other => other,
        };

        if section.inverted {
            return if value.as_ref().is_some_and(Value::is_truthy) {
                Ok(String::new())
            } else {
                self.render_nodes(&section.children, context).await
            };
        }

        match value {
            None => Ok(String::new()),
            Some(value) if !value.is_truthy() => Ok(String::new()),
            Some(Value::List(items)) => {
                let parts = try_join_all(items.iter().map(|item| async move {
                    let frame = context.push(item.clone().settle().await?);
                    self.render_nodes(&section.children, &frame).await
                }))
                .await?;
                Ok(parts.concat())
            }
            Some(view @ Value::Map(_)) => {
                let frame = context.push(view);
                self.render_nodes(&section.children, &frame).await
            }
            Some(Value::Lambda(Lambda::Section(f))) => {
                let sub = SubRender {
                    renderer: self.clone(),
                    context: Arc::clone(context),
                    tags: section.tags.clone(),
                };
                let output = f(section.raw.clone(), sub).settle().await?;
                Ok(output.to_output_string())
            }
            Some(_) => self.render_nodes(&section.children, context).await,
        }
    }

    async fn render_partial(
        &self,
        partial: &PartialNode,
        context: &Arc<Context>,
    ) -> MustacheResult<String> {
        let Some(source) = self.partials.get(&partial.name) else {
            return Ok(String::new());
        };
        let source = partial.indent.apply(&source);
        self.render_source(&source, &self.tags, context).await
    }
}

/// Handle passed to section lambdas for rendering text as a template.
///
/// Renders against the context the section was reached with, using the
/// delimiters in effect at the section's open tag.
#[derive(Debug, Clone)]
pub struct SubRender {
    renderer: Renderer,
    context: Arc<Context>,
    tags: Tags,
}

impl SubRender {
    /// Render `text` as a template.
    pub fn render(&self, text: &str) -> BoxFuture<'static, MustacheResult<String>> {
        let sub = self.clone();
        let text = text.to_string();
        async move {
            sub.renderer
                .render_source(&text, &sub.tags, &sub.context)
                .await
        }
        .boxed()
    }

    /// The view of the innermost frame at the section.
    pub fn view(&self) -> &Value {
        self.context.view()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}
