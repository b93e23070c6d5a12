//! Documents and document identifiers

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::value::Value;

/// Name of the identifier field carried by every stored document
pub const ID_FIELD: &str = "_id";

/// Errors raised while converting external data into documents
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    /// Top-level JSON was not an object
    #[error("document must be a JSON object, got {0}")]
    NotAnObject(String),

    /// A field held an array or nested object
    #[error("field '{0}' holds an unsupported value (arrays and nested objects are not stored)")]
    UnsupportedValue(String),
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        "FOLIO_INVALID_DOCUMENT"
    }
}

/// Unique identifier of a stored document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier, optionally prefixed.
    pub fn generate(prefix: Option<&str>) -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        match prefix {
            Some(p) => Self(format!("{}{}", p, raw)),
            None => Self(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A document: mapping from field name to scalar value.
///
/// Fields iterate in name order, so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Builds a document from a JSON object of scalars.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DocumentError> {
        let serde_json::Value::Object(map) = value else {
            return Err(DocumentError::NotAnObject(value.to_string()));
        };

        let mut fields = BTreeMap::new();
        for (name, raw) in map {
            let v = Value::from_json(raw)
                .ok_or_else(|| DocumentError::UnsupportedValue(name.clone()))?;
            fields.insert(name.clone(), v);
        }
        Ok(Self { fields })
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Returns the `_id` of the document if it is a string
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let doc = Document::from_json(&json!({
            "title": "Dune",
            "published_year": 1965,
            "price": 10.0,
            "in_stock": true
        }))
        .unwrap();

        assert_eq!(doc.get("title"), Some(&Value::from("Dune")));
        assert_eq!(doc.get("published_year"), Some(&Value::Int(1965)));
        assert_eq!(doc.get("in_stock"), Some(&Value::Bool(true)));
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        let err = Document::from_json(&json!({"tags": ["a", "b"]})).unwrap_err();
        assert_eq!(err, DocumentError::UnsupportedValue("tags".into()));

        let err = Document::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, DocumentError::NotAnObject(_)));
    }

    #[test]
    fn test_id_accessor() {
        let doc = Document::new().with(ID_FIELD, "book_1").with("title", "1984");
        assert_eq!(doc.id(), Some("book_1"));

        let doc = Document::new().with(ID_FIELD, 7);
        assert_eq!(doc.id(), None);
    }

    #[test]
    fn test_generated_ids_are_unique_and_prefixed() {
        let a = DocumentId::generate(Some("book_"));
        let b = DocumentId::generate(Some("book_"));
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("book_"));
    }

    #[test]
    fn test_fields_iterate_in_name_order() {
        let doc = Document::new().with("zeta", 1).with("alpha", 2).with("mid", 3);
        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    }
}
