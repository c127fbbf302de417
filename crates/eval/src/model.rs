//! Model documents.
//!
//! A model is an external document that document-bound facts read from and
//! write to. Several facts may share one model; a write through one of them
//! makes the others stale, which the scheduler handles by re-evaluating every
//! fact bound to the same model id.

use std::collections::BTreeMap;
use std::fmt;

use evident_core::{NodeHandle, Value};

use crate::error::EngineError;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Failures reported by a document implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("no value at {path}")]
    Missing { path: String },

    #[error("cannot write {path}: {reason}")]
    Unwritable { path: String, reason: String },
}

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// A host document addressed by string paths.
pub trait Document: fmt::Debug + Send + Sync {
    /// Read the raw value at `path`. `None` when nothing (or null) is there.
    fn read(&self, path: &str) -> Option<Value>;

    /// Write a scalar value at `path`.
    fn write(&mut self, path: &str, value: &Value) -> Result<(), DocumentError>;

    /// An independent copy, used when a registry is cloned.
    fn duplicate(&self) -> Box<dyn Document>;

    /// JSON rendering of the whole document.
    fn snapshot(&self) -> serde_json::Value;
}

// ──────────────────────────────────────────────
// JsonDocument
// ──────────────────────────────────────────────

/// A JSON document addressed by JSON Pointer paths (`/order/total`).
///
/// Objects and arrays read back as [`Value::Node`] handles carrying their
/// pointer. Writing replaces an existing value, or adds a missing key to an
/// existing object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: serde_json::Value,
}

impl JsonDocument {
    pub fn new(root: serde_json::Value) -> Self {
        JsonDocument { root }
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(JsonDocument::new)
    }

    pub fn root(&self) -> &serde_json::Value {
        &self.root
    }
}

impl Document for JsonDocument {
    fn read(&self, path: &str) -> Option<Value> {
        match self.root.pointer(path)? {
            serde_json::Value::Null => None,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                Some(Value::Node(NodeHandle::new(path)))
            }
            scalar => Value::from_json(scalar),
        }
    }

    fn write(&mut self, path: &str, value: &Value) -> Result<(), DocumentError> {
        let json = value.to_json();
        if let Some(slot) = self.root.pointer_mut(path) {
            *slot = json;
            return Ok(());
        }
        let unwritable = |reason: &str| DocumentError::Unwritable {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let (parent, key) = path
            .rsplit_once('/')
            .ok_or_else(|| unwritable("not a JSON pointer"))?;
        match self.root.pointer_mut(parent) {
            Some(serde_json::Value::Object(map)) => {
                map.insert(unescape(key), json);
                Ok(())
            }
            Some(_) => Err(unwritable("parent is not an object")),
            None => Err(unwritable("parent does not exist")),
        }
    }

    fn duplicate(&self) -> Box<dyn Document> {
        Box::new(self.clone())
    }

    fn snapshot(&self) -> serde_json::Value {
        self.root.clone()
    }
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

// ──────────────────────────────────────────────
// Models
// ──────────────────────────────────────────────

/// Model documents keyed by model id.
#[derive(Debug, Default)]
pub struct Models {
    documents: BTreeMap<String, Box<dyn Document>>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, document: Box<dyn Document>) -> Result<(), EngineError> {
        if self.documents.contains_key(id) {
            return Err(EngineError::DuplicateModel { id: id.to_string() });
        }
        self.documents.insert(id.to_string(), document);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&dyn Document, EngineError> {
        self.documents
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| EngineError::UnknownModel { id: id.to_string() })
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut dyn Document, EngineError> {
        match self.documents.get_mut(id) {
            Some(d) => Ok(d.as_mut()),
            None => Err(EngineError::UnknownModel { id: id.to_string() }),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Clone for Models {
    fn clone(&self) -> Self {
        Models {
            documents: self
                .documents
                .iter()
                .map(|(id, doc)| (id.clone(), doc.duplicate()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order() -> JsonDocument {
        JsonDocument::new(json!({
            "order": { "total": 120.5, "express": true, "lines": [1, 2], "note": null },
            "customer": "acme"
        }))
    }

    #[test]
    fn reads_scalars_and_nodes() {
        let doc = order();
        assert_eq!(doc.read("/order/total"), Some(Value::Number(120.5)));
        assert_eq!(doc.read("/order/express"), Some(Value::Boolean(true)));
        assert_eq!(doc.read("/customer"), Some(Value::from("acme")));
        assert_eq!(
            doc.read("/order/lines"),
            Some(Value::Node(NodeHandle::new("/order/lines")))
        );
        assert_eq!(doc.read("/order/note"), None);
        assert_eq!(doc.read("/missing"), None);
    }

    #[test]
    fn writes_existing_and_new_keys() {
        let mut doc = order();
        doc.write("/order/total", &Value::Number(99.0)).unwrap();
        doc.write("/order/status", &Value::from("paid")).unwrap();
        assert_eq!(doc.root()["order"]["total"], json!(99));
        assert_eq!(doc.root()["order"]["status"], json!("paid"));
    }

    #[test]
    fn rejects_writes_without_object_parent() {
        let mut doc = order();
        assert!(matches!(
            doc.write("/nowhere/x", &Value::Number(1.0)),
            Err(DocumentError::Unwritable { .. })
        ));
        assert!(matches!(
            doc.write("/customer/x", &Value::Number(1.0)),
            Err(DocumentError::Unwritable { .. })
        ));
    }

    #[test]
    fn models_reject_duplicates_and_unknown_ids() {
        let mut models = Models::new();
        models.insert("order", Box::new(order())).unwrap();
        assert_eq!(
            models.insert("order", Box::new(order())).unwrap_err(),
            EngineError::DuplicateModel {
                id: "order".into()
            }
        );
        assert!(matches!(
            models.get("nope"),
            Err(EngineError::UnknownModel { .. })
        ));
    }

    #[test]
    fn cloned_models_are_independent() {
        let mut models = Models::new();
        models.insert("order", Box::new(order())).unwrap();
        let mut copy = models.clone();
        copy.get_mut("order")
            .unwrap()
            .write("/customer", &Value::from("globex"))
            .unwrap();
        assert_eq!(
            models.get("order").unwrap().read("/customer"),
            Some(Value::from("acme"))
        );
    }
}
