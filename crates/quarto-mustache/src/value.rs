/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! View values.
//!
//! A [`Value`] is what the context stack resolves paths to. Besides plain
//! data it can hold a [`Lambda`] (computed output) or a [`PendingValue`]
//! (a value that is not available yet). Pending values are settled before a
//! value is classified, so the renderer never branches on them directly.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, try_join_all};

use crate::error::MustacheResult;
use crate::renderer::SubRender;

type VariableLambdaFn = dyn Fn() -> Value + Send + Sync;
type SectionLambdaFn = dyn Fn(String, SubRender) -> Value + Send + Sync;

/// A callable view value.
///
/// The two shapes are fixed when the lambda is built rather than guessed
/// from the call site.
#[derive(Clone)]
pub enum Lambda {
    /// Returns template text that is rendered in place of the tag.
    Variable(Arc<VariableLambdaFn>),
    /// Receives the section's raw inner text and a [`SubRender`] handle;
    /// its return value is the section's output, emitted unescaped.
    Section(Arc<SectionLambdaFn>),
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lambda::Variable(_) => f.write_str("Lambda::Variable(..)"),
            Lambda::Section(_) => f.write_str("Lambda::Section(..)"),
        }
    }
}

/// A value still being produced.
///
/// Cloning shares the underlying computation; it runs at most once no
/// matter how many nodes await it.
#[derive(Clone)]
pub struct PendingValue(Shared<BoxFuture<'static, MustacheResult<Value>>>);

impl PendingValue {
    pub fn new(future: impl Future<Output = MustacheResult<Value>> + Send + 'static) -> Self {
        Self(future.boxed().shared())
    }

    /// Wait for the producer to finish.
    pub async fn resolve(&self) -> MustacheResult<Value> {
        self.0.clone().await
    }
}

impl fmt::Debug for PendingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingValue(..)")
    }
}

/// A value that can be used in template rendering.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A null/missing value.
    #[default]
    Null,

    Bool(bool),

    Number(serde_json::Number),

    String(String),

    /// A list of values. Sections iterate over it.
    List(Arc<Vec<Value>>),

    /// A map of string keys to values. Dotted paths descend into it.
    Map(Arc<HashMap<String, Value>>),

    Lambda(Lambda),

    Pending(PendingValue),
}

impl Value {
    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map value.
    pub fn map(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<Value>)>) -> Self {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// A lambda for variable position: its return value is rendered as a template.
    pub fn lambda(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Value::Lambda(Lambda::Variable(Arc::new(f)))
    }

    /// A lambda for section position, called with the raw section text.
    pub fn section_lambda(f: impl Fn(String, SubRender) -> Value + Send + Sync + 'static) -> Self {
        Value::Lambda(Lambda::Section(Arc::new(f)))
    }

    /// A value produced later by `future`.
    pub fn pending(future: impl Future<Output = MustacheResult<Value>> + Send + 'static) -> Self {
        Value::Pending(PendingValue::new(future))
    }

    /// Await this value until it is no longer pending.
    pub async fn settle(self) -> MustacheResult<Value> {
        let mut value = self;
        while let Value::Pending(pending) = value {
            value = pending.resolve().await?;
        }
        Ok(value)
    }

    /// Settle this value and every pending element of the lists inside it.
    ///
    /// Interpolating a list stringifies its elements, so they must all be
    /// settled first. Elements are awaited together and keep their order.
    pub fn settle_deep(self) -> BoxFuture<'static, MustacheResult<Value>> {
        async move {
            match self.settle().await? {
                Value::List(items) if !items.iter().all(Value::is_settled) => {
                    let items =
                        try_join_all(items.iter().cloned().map(Value::settle_deep)).await?;
                    Ok(Value::List(Arc::new(items)))
                }
                value => Ok(value),
            }
        }
        .boxed()
    }

    fn is_settled(&self) -> bool {
        match self {
            Value::Pending(_) => false,
            Value::List(items) => items.iter().all(Value::is_settled),
            _ => true,
        }
    }

    /// Look up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Check if this value is "truthy" for section evaluation.
    ///
    /// - `false`, null, zero, the empty string and the empty list are falsy
    /// - maps are truthy even when empty
    /// - lambdas and pending values are truthy (pending values are settled
    ///   before the renderer asks)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(_) | Value::Lambda(_) | Value::Pending(_) => true,
        }
    }

    /// Render this value as text for interpolation.
    pub fn to_output_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_output_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) | Value::Lambda(_) | Value::Pending(_) => String::new(),
        }
    }

    /// The name of this value's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
            Value::Lambda(_) => "function",
            Value::Pending(_) => "pending",
        }
    }
}

/// Shortest decimal form: whole floats print without a fractional part.
fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}
