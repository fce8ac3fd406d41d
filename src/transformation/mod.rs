//! Transformation chain model and serialization
//!
//! A request carries an ordered list of [`TransformationStep`]s. Each step
//! serializes to a comma-separated token list and adjacent steps are chained
//! with `:`:
//!
//! ```text
//! [{height: 300, width: 400}, {rotation: 90}]  →  h-300,w-400:rt-90
//! ```
//!
//! Overlays nest a whole step under a layer kind:
//!
//! ```text
//! {image: {input: "logo.png", width: 100}}  →  l-image,i-logo.png,w-100,l-end
//! ```

pub mod grammar;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ImageKitError, Result};
use grammar::{ParamKind, RAW};

/// Delimiter between chained steps
pub const CHAIN_DELIMITER: &str = ":";

/// Where the serialized chain is placed in the URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// `?tr=...` (default)
    #[default]
    Query,
    /// `endpoint/tr:.../path`
    Path,
}

impl FromStr for Position {
    type Err = ImageKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "query" => Ok(Position::Query),
            "path" => Ok(Position::Path),
            _ => Err(ImageKitError::invalid_input(
                "position",
                format!("unknown transformation position: {}", s),
            )),
        }
    }
}

/// Whether keys outside the grammar table are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformationPolicy {
    /// Unknown keys pass through verbatim
    #[default]
    Permissive,
    /// Unknown keys fail with `UnsupportedTransformation`
    Strict,
}

/// A single transformation parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Nested step rendered as an overlay layer
    Layer(TransformationStep),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<TransformationStep> for Value {
    fn from(v: TransformationStep) -> Self {
        Value::Layer(v)
    }
}

impl Value {
    /// Infer a value from command-line text: integer, float, boolean, else string
    pub fn infer(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Str(raw.to_string()),
        }
    }
}

/// One stage of a transformation chain: an insertion-ordered parameter map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationStep {
    params: Vec<(String, Value)>,
}

impl TransformationStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; an existing key keeps its position and takes the new value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize to `code-value` tokens joined by `,`
    ///
    /// Known parameters come first in grammar order, then everything else
    /// (unknown keys and layers) in insertion order.
    pub fn serialize(&self, policy: TransformationPolicy) -> Result<String> {
        let mut known: Vec<(usize, String)> = Vec::new();
        let mut rest: Vec<String> = Vec::new();

        for (key, value) in &self.params {
            if let Value::Layer(inner) = value {
                if policy == TransformationPolicy::Strict
                    && !grammar::LAYER_KINDS.contains(&key.as_str())
                {
                    return Err(ImageKitError::unsupported(key.as_str()));
                }
                rest.push(serialize_layer(key, inner, policy)?);
                continue;
            }

            match grammar::lookup(key) {
                Some((rank, spec)) => {
                    if let Some(token) = render_token(spec.code, spec.kind, value) {
                        known.push((rank, token));
                    }
                }
                None => {
                    if policy == TransformationPolicy::Strict {
                        return Err(ImageKitError::unsupported(key.as_str()));
                    }
                    if let Some(token) = render_token(key, ParamKind::Valued, value) {
                        rest.push(token);
                    }
                }
            }
        }

        known.sort_by_key(|(rank, _)| *rank);

        Ok(known
            .into_iter()
            .map(|(_, token)| token)
            .chain(rest)
            .collect::<Vec<_>>()
            .join(","))
    }
}

impl FromStr for TransformationStep {
    type Err = ImageKitError;

    /// Parse `width=400,height=300,effect_gray`
    ///
    /// Bare keys become `true`; values are typed with [`Value::infer`].
    fn from_str(s: &str) -> Result<Self> {
        let mut step = TransformationStep::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            match part.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(ImageKitError::invalid_input(
                            "transformation",
                            format!("missing key in '{}'", part),
                        ));
                    }
                    step.set(key, Value::infer(value.trim()));
                }
                None => step.set(part, true),
            }
        }

        Ok(step)
    }
}

impl fmt::Display for TransformationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.serialize(TransformationPolicy::Permissive) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn render_token(code: &str, kind: ParamKind, value: &Value) -> Option<String> {
    let token = match value {
        Value::Str(s) if code == RAW => s.clone(),
        Value::Str(s) if s == "-" => code.to_string(),
        Value::Str(s) => format!("{}-{}", code, urlencoding::encode(s)),
        Value::Int(i) => format!("{}-{}", code, i),
        Value::Float(x) => format!("{}-{}", code, x),
        Value::Bool(b) => match kind {
            ParamKind::Valued => format!("{}-{}", code, b),
            ParamKind::Flag if *b => code.to_string(),
            ParamKind::Flag => return None,
        },
        Value::Layer(_) => return None,
    };
    Some(token)
}

fn serialize_layer(
    kind: &str,
    inner: &TransformationStep,
    policy: TransformationPolicy,
) -> Result<String> {
    let body = inner.serialize(policy)?;
    if body.is_empty() {
        Ok(format!("l-{},l-end", kind))
    } else {
        Ok(format!("l-{},{},l-end", kind, body))
    }
}

/// Serialize a whole chain; empty steps are dropped
pub fn serialize_chain(
    steps: &[TransformationStep],
    policy: TransformationPolicy,
) -> Result<String> {
    let mut parts = Vec::with_capacity(steps.len());
    for step in steps {
        let serialized = step.serialize(policy)?;
        if !serialized.is_empty() {
            parts.push(serialized);
        }
    }
    Ok(parts.join(CHAIN_DELIMITER))
}
