//! Index error types
//!
//! Error codes:
//! - FOLIO_INDEX_EXISTS
//! - FOLIO_INVALID_INDEX_SPEC
//! - FOLIO_INDEX_NOT_FOUND
//! - FOLIO_DUPLICATE_KEY

use thiserror::Error;

/// Index-specific errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// An index with the identical key pattern already exists
    #[error("index already exists with the same key pattern: {name}")]
    IndexExists { name: String },

    /// Empty pattern, repeated field, or bad direction
    #[error("invalid index specification: {0}")]
    InvalidSpec(String),

    /// No index with the given name
    #[error("index not found: {0}")]
    NotFound(String),

    /// A unique index already holds the key
    #[error("duplicate key in unique index {index}: {key}")]
    DuplicateKey { index: String, key: String },
}

impl IndexError {
    pub fn index_exists(name: impl Into<String>) -> Self {
        IndexError::IndexExists { name: name.into() }
    }

    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        IndexError::InvalidSpec(reason.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        IndexError::NotFound(name.into())
    }

    pub fn duplicate_key(index: impl Into<String>, key: impl Into<String>) -> Self {
        IndexError::DuplicateKey {
            index: index.into(),
            key: key.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::IndexExists { .. } => "FOLIO_INDEX_EXISTS",
            IndexError::InvalidSpec(_) => "FOLIO_INVALID_INDEX_SPEC",
            IndexError::NotFound(_) => "FOLIO_INDEX_NOT_FOUND",
            IndexError::DuplicateKey { .. } => "FOLIO_DUPLICATE_KEY",
        }
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(IndexError::index_exists("title_1").code(), "FOLIO_INDEX_EXISTS");
        assert_eq!(IndexError::invalid_spec("x").code(), "FOLIO_INVALID_INDEX_SPEC");
        assert_eq!(IndexError::not_found("x").code(), "FOLIO_INDEX_NOT_FOUND");
        assert_eq!(
            IndexError::duplicate_key("isbn_1", "\"123\"").code(),
            "FOLIO_DUPLICATE_KEY"
        );
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::index_exists("author_1_published_year_-1");
        assert!(err.to_string().contains("author_1_published_year_-1"));
    }
}
