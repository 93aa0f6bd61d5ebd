//! Field extraction from decoded API responses
//!
//! Responses arrive as loosely typed JSON. Each endpoint gets a record type
//! implementing [`FromNode`]; the record is built once at the boundary through
//! the accessors on [`Node`], and collectors only ever see the typed record.
//!
//! Accessors never fail. A key that is absent or `null` yields the caller's
//! default silently; a key whose value cannot be coerced to the requested kind
//! yields the default and logs a warning.
use log::warn;
use serde_json::{Map, Value};

use crate::error::{ExporterError, Result};

/// The kind a field is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Number,
    Bool,
}

/// A field value coerced to a [`FieldKind`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Format a number with the shortest decimal representation that round-trips
///
/// Whole numbers carry no fractional part, so `1.0` renders as `"1"`.
pub fn format_label(value: f64) -> String {
    format!("{}", value)
}

/// Coerce a raw JSON value to the requested kind.
///
/// Returns `None` when the value is of an incompatible shape. Numeric strings
/// coerce to numbers because report tables ship every cell as text.
pub fn coerce(value: &Value, kind: FieldKind) -> Option<FieldValue> {
    match (kind, value) {
        (FieldKind::Str, Value::String(s)) => Some(FieldValue::Str(s.clone())),
        (FieldKind::Str, Value::Number(n)) => n.as_f64().map(|n| FieldValue::Str(format_label(n))),
        (FieldKind::Str, Value::Bool(b)) => Some(FieldValue::Str(b.to_string())),
        (FieldKind::Number, Value::Number(n)) => n.as_f64().map(FieldValue::Number),
        (FieldKind::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FieldValue::Number),
        (FieldKind::Bool, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        (FieldKind::Bool, Value::String(s)) => match s.as_str() {
            "true" => Some(FieldValue::Bool(true)),
            "false" => Some(FieldValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Pull `key` out of `node` as `kind`, falling back to `default`
pub fn extract(node: &Map<String, Value>, key: &str, kind: FieldKind, default: FieldValue) -> FieldValue {
    lookup(node, key, kind, "response").unwrap_or(default)
}

fn lookup(node: &Map<String, Value>, key: &str, kind: FieldKind, context: &str) -> Option<FieldValue> {
    match node.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let coerced = coerce(value, kind);
            if coerced.is_none() {
                warn!(
                    "Field '{}' in {} is not a {:?} (got {}), using default",
                    key,
                    context,
                    kind,
                    shape(value)
                );
            }
            coerced
        }
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A borrowed view over one JSON object with typed accessors
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    map: &'a Map<String, Value>,
    context: &'a str,
}

impl<'a> Node<'a> {
    /// View `value` as an object node.
    ///
    /// This is the only place a response shape can be rejected outright.
    pub fn new(value: &'a Value, context: &'a str) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, context }),
            other => Err(ExporterError::decode(
                context,
                format!("expected an object, got {}", shape(other)),
            )),
        }
    }

    /// View a value as an object node, or `None` if it is not an object
    pub fn from_value(value: &'a Value, context: &'a str) -> Option<Self> {
        value.as_object().map(|map| Self { map, context })
    }

    pub fn context(&self) -> &'a str {
        self.context
    }

    /// Whether the key is present with a non-null value
    pub fn has(&self, key: &str) -> bool {
        !matches!(self.map.get(key), None | Some(Value::Null))
    }

    /// Number or `None` when absent, null, or malformed
    pub fn number(&self, key: &str) -> Option<f64> {
        lookup(self.map, key, FieldKind::Number, self.context).and_then(|v| v.as_f64())
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    /// String or `None` when absent, null, or malformed
    pub fn string(&self, key: &str) -> Option<String> {
        match lookup(self.map, key, FieldKind::Str, self.context) {
            Some(FieldValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match lookup(self.map, key, FieldKind::Bool, self.context) {
            Some(FieldValue::Bool(b)) => b,
            _ => default,
        }
    }

    /// Nested object, or `None` when absent or not an object
    pub fn child(&self, key: &str) -> Option<Node<'a>> {
        match self.map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(Node { map, context: self.context }),
            Some(other) => {
                warn!(
                    "Field '{}' in {} is not an object (got {}), ignoring",
                    key,
                    self.context,
                    shape(other)
                );
                None
            }
        }
    }

    /// Array elements, empty when absent or not an array
    pub fn array(&self, key: &str) -> &'a [Value] {
        match self.map.get(key) {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                warn!(
                    "Field '{}' in {} is not an array (got {}), treating as empty",
                    key,
                    self.context,
                    shape(other)
                );
                &[]
            }
        }
    }

    /// Object elements of an array field; non-object elements are skipped
    pub fn objects(&self, key: &str) -> Vec<Node<'a>> {
        let context = self.context;
        self.array(key)
            .iter()
            .filter_map(|item| {
                let node = Node::from_value(item, context);
                if node.is_none() {
                    warn!("Skipping non-object element of '{}' in {}", key, context);
                }
                node
            })
            .collect()
    }
}

/// A record decoded from one response shape
pub trait FromNode: Sized {
    fn from_node(node: &Node<'_>) -> Self;
}

/// Decode a response body into its record type
pub fn decode<T: FromNode>(body: &Value, context: &str) -> Result<T> {
    let node = Node::new(body, context)?;
    Ok(T::from_node(&node))
}

/// Decode each object in the body's `data` array
pub fn decode_data<T: FromNode>(body: &Value, context: &str) -> Result<Vec<T>> {
    let node = Node::new(body, context)?;
    if !node.has("data") {
        return Err(ExporterError::decode(context, "missing 'data' array"));
    }
    Ok(node.objects("data").iter().map(T::from_node).collect())
}
