//! Projections
//!
//! A projection is either inclusion-only or exclusion-only. The one
//! exception is `_id`, which may be excluded from an inclusion projection.

use crate::document::{Document, ID_FIELD};

use super::errors::{QueryError, QueryResult};

/// Field selection applied to result documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Keep only the listed fields (plus `_id` unless `id` is false)
    Include { fields: Vec<String>, id: bool },
    /// Drop the listed fields
    Exclude { fields: Vec<String> },
}

impl Projection {
    /// Inclusion projection that keeps `_id`
    pub fn include<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Include {
            fields: fields.into_iter().map(Into::into).collect(),
            id: true,
        }
    }

    /// Exclusion projection
    pub fn exclude<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Exclude {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Drops `_id` from an inclusion projection, or adds it to an exclusion.
    pub fn without_id(self) -> Self {
        match self {
            Projection::Include { fields, .. } => Projection::Include { fields, id: false },
            Projection::Exclude { mut fields } => {
                if !fields.iter().any(|f| f == ID_FIELD) {
                    fields.push(ID_FIELD.to_string());
                }
                Projection::Exclude { fields }
            }
        }
    }

    /// Builds a projection from `(field, include)` pairs.
    ///
    /// Fails with `InvalidProjection` when non-id fields mix inclusion and
    /// exclusion.
    pub fn from_fields<S: Into<String>>(
        spec: impl IntoIterator<Item = (S, bool)>,
    ) -> QueryResult<Self> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut id_flag = None;

        for (field, include) in spec {
            let field = field.into();
            if field.is_empty() {
                return Err(QueryError::invalid_projection("field name must not be empty"));
            }
            if field == ID_FIELD {
                id_flag = Some(include);
            } else if include {
                included.push(field);
            } else {
                excluded.push(field);
            }
        }

        if !included.is_empty() && !excluded.is_empty() {
            return Err(QueryError::invalid_projection(format!(
                "cannot mix inclusion of [{}] with exclusion of [{}]",
                included.join(", "),
                excluded.join(", ")
            )));
        }

        if !included.is_empty() {
            return Ok(Projection::Include {
                fields: included,
                id: id_flag.unwrap_or(true),
            });
        }

        match id_flag {
            // `{_id: 1}` alone keeps only the identifier
            Some(true) if excluded.is_empty() => Ok(Projection::Include {
                fields: Vec::new(),
                id: true,
            }),
            Some(false) => {
                excluded.push(ID_FIELD.to_string());
                Ok(Projection::Exclude { fields: excluded })
            }
            _ => Ok(Projection::Exclude { fields: excluded }),
        }
    }

    /// Parses `{"title": 1, "price": 1, "_id": 0}`.
    pub fn from_json(raw: &serde_json::Value) -> QueryResult<Self> {
        let serde_json::Value::Object(map) = raw else {
            return Err(QueryError::invalid_projection(format!(
                "projection must be an object, got {}",
                raw
            )));
        };

        let mut spec = Vec::with_capacity(map.len());
        for (field, flag) in map {
            let include = match flag {
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(false),
                other => {
                    return Err(QueryError::invalid_projection(format!(
                        "value for '{}' must be 0/1 or a boolean, got {}",
                        field, other
                    )))
                }
            };
            spec.push((field.clone(), include));
        }

        Self::from_fields(spec)
    }

    /// Applies the projection to a document
    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            Projection::Include { fields, id } => {
                let mut out = Document::new();
                if *id {
                    if let Some(v) = doc.get(ID_FIELD) {
                        out.set(ID_FIELD, v.clone());
                    }
                }
                for field in fields {
                    if let Some(v) = doc.get(field) {
                        out.set(field.clone(), v.clone());
                    }
                }
                out
            }
            Projection::Exclude { fields } => {
                let mut out = doc.clone();
                for field in fields {
                    out.remove(field);
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;
    use serde_json::json;

    fn book() -> Document {
        Document::from_json(&json!({
            "_id": "b1",
            "title": "Dune",
            "author": "Frank Herbert",
            "price": 10.0,
            "in_stock": true
        }))
        .unwrap()
    }

    #[test]
    fn test_inclusion_hides_id_when_requested() {
        let projection =
            Projection::from_json(&json!({"title": 1, "author": 1, "price": 1, "_id": 0})).unwrap();
        let out = projection.apply(&book());

        assert_eq!(out.len(), 3);
        assert_eq!(out.get("title"), Some(&Value::from("Dune")));
        assert!(!out.contains("_id"));
        assert!(!out.contains("in_stock"));
    }

    #[test]
    fn test_inclusion_keeps_id_by_default() {
        let out = Projection::include(["title"]).apply(&book());
        assert_eq!(out.id(), Some("b1"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_exclusion() {
        let out = Projection::exclude(["price", "in_stock"]).apply(&book());
        assert_eq!(out.len(), 3);
        assert!(!out.contains("price"));
    }

    #[test]
    fn test_mixed_projection_rejected() {
        let err = Projection::from_json(&json!({"title": 1, "price": 0})).unwrap_err();
        assert_eq!(err.code(), "FOLIO_INVALID_PROJECTION");
    }

    #[test]
    fn test_id_only_projections() {
        assert_eq!(
            Projection::from_json(&json!({"_id": 0})).unwrap(),
            Projection::Exclude {
                fields: vec!["_id".into()]
            }
        );
        let out = Projection::from_json(&json!({"_id": 1})).unwrap().apply(&book());
        assert_eq!(out.len(), 1);
        assert_eq!(out.id(), Some("b1"));
    }

    #[test]
    fn test_missing_included_field_is_skipped() {
        let out = Projection::include(["isbn"]).without_id().apply(&book());
        assert!(out.is_empty());
    }
}
