//! Value sources.
//!
//! Every evidence node stores its value through a [`ValueSource`]: either a
//! naked in-memory slot, or a binding to a path inside a model document.

use evident_core::{Value, ValueKind};

use crate::error::EngineError;
use crate::model::{DocumentError, Models};

/// Where a node's value lives.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    /// In-memory value, absent until first written.
    Naked(Option<Value>),
    /// Typed binding into a model document.
    Bound(Binding),
}

/// A typed binding to `path` inside model `model_id`. The last value read
/// or written is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub model_id: String,
    pub path: String,
    pub kind: ValueKind,
    cached: Option<Value>,
}

impl ValueSource {
    pub fn naked(value: Option<Value>) -> Self {
        ValueSource::Naked(value)
    }

    pub fn bound(model_id: impl Into<String>, path: impl Into<String>, kind: ValueKind) -> Self {
        ValueSource::Bound(Binding {
            model_id: model_id.into(),
            path: path.into(),
            kind,
            cached: None,
        })
    }

    /// The current value, if any.
    pub fn get(&self) -> Option<&Value> {
        match self {
            ValueSource::Naked(v) => v.as_ref(),
            ValueSource::Bound(b) => b.cached.as_ref(),
        }
    }

    pub fn model_id(&self) -> Option<&str> {
        match self {
            ValueSource::Naked(_) => None,
            ValueSource::Bound(b) => Some(&b.model_id),
        }
    }

    /// Store a value. Returns whether the stored value changed.
    pub fn set(&mut self, value: Value, models: &mut Models) -> Result<bool, EngineError> {
        match self {
            ValueSource::Naked(slot) => {
                if slot.as_ref() == Some(&value) {
                    return Ok(false);
                }
                *slot = Some(value);
                Ok(true)
            }
            ValueSource::Bound(b) => {
                if b.kind == ValueKind::Node {
                    return Err(b.error(format!("{} is node-typed and cannot be written", b.path)));
                }
                let value = b.coerce(value)?;
                models
                    .get_mut(&b.model_id)?
                    .write(&b.path, &value)
                    .map_err(|e| b.error(e.to_string()))?;
                Ok(b.replace(Some(value)))
            }
        }
    }

    /// Clear the value. Returns whether a value was present.
    pub fn clear(&mut self) -> bool {
        match self {
            ValueSource::Naked(slot) => slot.take().is_some(),
            ValueSource::Bound(b) => b.replace(None),
        }
    }

    /// Recompute from the external source. Naked values have nothing to
    /// recompute. Returns whether the value changed.
    pub fn evaluate(&mut self, models: &Models) -> Result<bool, EngineError> {
        match self {
            ValueSource::Naked(_) => Ok(false),
            ValueSource::Bound(b) => {
                let raw = models.get(&b.model_id)?.read(&b.path).ok_or_else(|| {
                    b.error(
                        DocumentError::Missing {
                            path: b.path.clone(),
                        }
                        .to_string(),
                    )
                })?;
                let value = b.coerce(raw)?;
                Ok(b.replace(Some(value)))
            }
        }
    }

    /// Drop any cached value so the next evaluation starts clean.
    pub fn reset(&mut self) {
        if let ValueSource::Bound(b) = self {
            b.cached = None;
        }
    }
}

impl Binding {
    fn replace(&mut self, value: Option<Value>) -> bool {
        let changed = self.cached != value;
        self.cached = value;
        changed
    }

    fn error(&self, message: String) -> EngineError {
        EngineError::Document {
            model_id: self.model_id.clone(),
            message,
        }
    }

    /// Coerce a raw value to the binding's declared kind. Empty text reads
    /// as zero or false.
    fn coerce(&self, raw: Value) -> Result<Value, EngineError> {
        let mismatch = |raw: &Value| {
            self.error(format!(
                "{}: cannot use {} `{}` as {}",
                self.path,
                raw.type_name(),
                raw,
                self.kind
            ))
        };
        match (self.kind, raw) {
            (ValueKind::Number, Value::Number(n)) => Ok(Value::Number(n)),
            (ValueKind::Number, Value::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(Value::Number(0.0))
                } else {
                    s.parse::<f64>()
                        .map(Value::Number)
                        .map_err(|_| mismatch(&Value::from(s)))
                }
            }
            (ValueKind::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (ValueKind::Boolean, Value::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(Value::Boolean(false))
                } else if s.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(mismatch(&Value::from(s)))
                }
            }
            (ValueKind::Text, Value::Node(h)) => Err(mismatch(&Value::Node(h))),
            (ValueKind::Text, Value::Invalid) => Err(mismatch(&Value::Invalid)),
            (ValueKind::Text, v) => Ok(Value::Text(v.to_string())),
            (ValueKind::Node, Value::Node(h)) => Ok(Value::Node(h)),
            (_, v) => Err(mismatch(&v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JsonDocument;
    use evident_core::NodeHandle;
    use serde_json::json;

    fn models() -> Models {
        let mut m = Models::new();
        m.insert(
            "order",
            Box::new(JsonDocument::new(json!({
                "total": "42",
                "blank": "",
                "flag": "TRUE",
                "qty": 3,
                "lines": [1]
            }))),
        )
        .unwrap();
        m
    }

    #[test]
    fn naked_set_reports_change_once() {
        let mut m = Models::new();
        let mut s = ValueSource::naked(None);
        assert!(s.set(Value::Number(1.0), &mut m).unwrap());
        assert!(!s.set(Value::Number(1.0), &mut m).unwrap());
        assert_eq!(s.get(), Some(&Value::Number(1.0)));
        assert!(!s.evaluate(&m).unwrap());
        s.reset();
        assert_eq!(s.get(), Some(&Value::Number(1.0)));
    }

    #[test]
    fn bound_reads_coerce_to_kind() {
        let m = models();
        let mut total = ValueSource::bound("order", "/total", ValueKind::Number);
        assert!(total.evaluate(&m).unwrap());
        assert_eq!(total.get(), Some(&Value::Number(42.0)));
        assert!(!total.evaluate(&m).unwrap());

        let mut blank = ValueSource::bound("order", "/blank", ValueKind::Number);
        blank.evaluate(&m).unwrap();
        assert_eq!(blank.get(), Some(&Value::Number(0.0)));

        let mut flag = ValueSource::bound("order", "/flag", ValueKind::Boolean);
        flag.evaluate(&m).unwrap();
        assert_eq!(flag.get(), Some(&Value::Boolean(true)));

        let mut qty = ValueSource::bound("order", "/qty", ValueKind::Text);
        qty.evaluate(&m).unwrap();
        assert_eq!(qty.get(), Some(&Value::from("3")));

        let mut lines = ValueSource::bound("order", "/lines", ValueKind::Node);
        lines.evaluate(&m).unwrap();
        assert_eq!(lines.get(), Some(&Value::Node(NodeHandle::new("/lines"))));
    }

    #[test]
    fn bound_read_failures() {
        let m = models();
        let mut missing = ValueSource::bound("order", "/nope", ValueKind::Number);
        assert!(matches!(
            missing.evaluate(&m),
            Err(EngineError::Document { .. })
        ));
        let mut wrong = ValueSource::bound("order", "/lines", ValueKind::Number);
        assert!(matches!(wrong.evaluate(&m), Err(EngineError::Document { .. })));
        let mut unbound = ValueSource::bound("invoice", "/x", ValueKind::Number);
        assert_eq!(
            unbound.evaluate(&m).unwrap_err(),
            EngineError::UnknownModel {
                id: "invoice".into()
            }
        );
    }

    #[test]
    fn bound_write_goes_to_document() {
        let mut m = models();
        let mut total = ValueSource::bound("order", "/total", ValueKind::Number);
        assert!(total.set(Value::from("7"), &mut m).unwrap());
        assert_eq!(total.get(), Some(&Value::Number(7.0)));
        assert_eq!(
            m.get("order").unwrap().read("/total"),
            Some(Value::Number(7.0))
        );
        total.reset();
        assert_eq!(total.get(), None);
    }

    #[test]
    fn node_typed_binding_is_read_only() {
        let mut m = models();
        let mut lines = ValueSource::bound("order", "/lines", ValueKind::Node);
        assert!(matches!(
            lines.set(Value::Number(1.0), &mut m),
            Err(EngineError::Document { .. })
        ));
    }
}
