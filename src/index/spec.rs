//! Index key patterns
//!
//! An index spec is an ordered list of (field, direction) pairs, e.g.
//! `{author: 1, published_year: -1}`. Its name follows the
//! `author_1_published_year_-1` convention.

use std::collections::HashSet;

use crate::document::Document;
use crate::planner::SortDirection;

use super::btree::{CompositeKey, KeyPart, KeySlot};
use super::errors::{IndexError, IndexResult};

/// A single indexed field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexField {
    pub field: String,
    pub direction: SortDirection,
}

/// Index specification: key pattern plus options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSpec {
    fields: Vec<IndexField>,
    unique: bool,
}

impl IndexSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending field
    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.fields.push(IndexField {
            field: field.into(),
            direction: SortDirection::Asc,
        });
        self
    }

    /// Appends a descending field
    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.fields.push(IndexField {
            field: field.into(),
            direction: SortDirection::Desc,
        });
        self
    }

    /// Rejects documents that share a key with another document
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Parses `{"author": 1, "published_year": -1}`.
    pub fn from_json(raw: &serde_json::Value) -> IndexResult<Self> {
        let serde_json::Value::Object(map) = raw else {
            return Err(IndexError::invalid_spec(format!(
                "key pattern must be an object, got {}",
                raw
            )));
        };

        let mut spec = IndexSpec::new();
        for (field, dir) in map {
            let direction = SortDirection::from_json(dir).ok_or_else(|| {
                IndexError::invalid_spec(format!(
                    "direction for '{}' must be 1 or -1, got {}",
                    field, dir
                ))
            })?;
            spec.fields.push(IndexField {
                field: field.clone(),
                direction,
            });
        }
        spec.validate()?;
        Ok(spec)
    }

    /// Validates the key pattern
    pub fn validate(&self) -> IndexResult<()> {
        if self.fields.is_empty() {
            return Err(IndexError::invalid_spec("key pattern must not be empty"));
        }

        let mut seen = HashSet::new();
        for f in &self.fields {
            if f.field.is_empty() {
                return Err(IndexError::invalid_spec("field name must not be empty"));
            }
            if !seen.insert(f.field.as_str()) {
                return Err(IndexError::invalid_spec(format!(
                    "field '{}' appears more than once",
                    f.field
                )));
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns true if both specs index the same fields in the same
    /// directions. Options are not compared.
    pub fn same_key_pattern(&self, other: &IndexSpec) -> bool {
        self.fields == other.fields
    }

    /// Conventional index name, e.g. `author_1_published_year_-1`
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}_{}", f.field, f.direction.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Returns true if the pattern includes the field
    pub fn covers(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Extracts the composite key of a document
    pub fn key_for(&self, doc: &Document) -> CompositeKey {
        CompositeKey(
            self.fields
                .iter()
                .map(|f| KeySlot::new(KeyPart::from_field(doc.get(&f.field)), f.direction))
                .collect(),
        )
    }
}
