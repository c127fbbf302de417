//! Runtime values flowing through expressions and evidence.
//!
//! `Value` is a closed tagged union. Operators are defined per variant pair
//! in [`crate::ops`]; any combination they do not define yields
//! [`Value::Invalid`] rather than an error.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Opaque handle to a node inside a model document.
///
/// The engine never interprets the handle; it only compares and carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(String);

impl NodeHandle {
    pub fn new(token: impl Into<String>) -> Self {
        NodeHandle(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
    Node(NodeHandle),
    /// The result of an operation on operands it does not support.
    Invalid,
}

/// The kind of a non-invalid value, used to type document-bound facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[serde(alias = "double")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "string")]
    Text,
    Node,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Text => "text",
            ValueKind::Node => "node",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Human-readable variant name for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::Text(_) => "Text",
            Value::Node(_) => "Node",
            Value::Invalid => "Invalid",
        }
    }

    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Number(_) => Some(ValueKind::Number),
            Value::Boolean(_) => Some(ValueKind::Boolean),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Node(_) => Some(ValueKind::Node),
            Value::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Ordering between two values of the same orderable kind.
    ///
    /// Numbers, texts and booleans order among themselves. Mixed kinds,
    /// nodes, `Invalid`, and NaN comparisons have no ordering.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert to JSON. Integral numbers are written without a fraction.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Node(h) => serde_json::json!({ "node": h.as_str() }),
            Value::Invalid => serde_json::Value::Null,
        }
    }

    /// Convert a scalar JSON value. `null`, arrays and objects yield `None`.
    pub fn from_json(v: &serde_json::Value) -> Option<Value> {
        match v {
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
            Value::Node(h) => write!(f, "{}", h),
            Value::Invalid => f.write_str("<invalid>"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural_per_variant() {
        assert_eq!(Value::Number(2.0), Value::Number(2.0));
        assert_ne!(Value::Number(2.0), Value::Text("2".into()));
        assert_eq!(Value::Text("a".into()), Value::from("a"));
        assert_ne!(Value::Boolean(true), Value::Boolean(false));
        assert_eq!(
            Value::Node(NodeHandle::new("/order")),
            Value::Node(NodeHandle::new("/order"))
        );
    }

    #[test]
    fn compare_defined_only_for_same_kind() {
        assert_eq!(
            Value::Number(1.0).compare(&Value::Number(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Number(1.0).compare(&Value::from("1")), None);
        assert_eq!(Value::Invalid.compare(&Value::Invalid), None);
        assert_eq!(Value::Number(f64::NAN).compare(&Value::Number(1.0)), None);
    }

    #[test]
    fn display_numbers_without_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn json_conversion() {
        assert_eq!(Value::Number(3.0).to_json(), serde_json::json!(3));
        assert_eq!(Value::Number(0.5).to_json(), serde_json::json!(0.5));
        assert_eq!(Value::Invalid.to_json(), serde_json::Value::Null);
        assert_eq!(
            Value::from_json(&serde_json::json!("x")),
            Some(Value::from("x"))
        );
        assert_eq!(Value::from_json(&serde_json::json!(null)), None);
        assert_eq!(Value::from_json(&serde_json::json!({"a": 1})), None);
    }

    #[test]
    fn value_kind_accepts_legacy_names() {
        let kind: ValueKind = serde_json::from_str("\"double\"").unwrap();
        assert_eq!(kind, ValueKind::Number);
        let kind: ValueKind = serde_json::from_str("\"string\"").unwrap();
        assert_eq!(kind, ValueKind::Text);
        let kind: ValueKind = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(kind, ValueKind::Boolean);
    }
}
