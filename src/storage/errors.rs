//! Storage error types
//!
//! Error codes:
//! - FOLIO_DUPLICATE_KEY
//! - FOLIO_INVALID_DOCUMENT
//! - FOLIO_IMMUTABLE_FIELD
//! - FOLIO_INVALID_MUTATION
//!
//! Every storage error is raised before the store changes.

use thiserror::Error;

use crate::document::DocumentError;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// A document with this identifier is already stored
    #[error("duplicate _id: {id}")]
    DuplicateKey { id: String },

    /// The document cannot be stored
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The mutation touches a field that cannot change
    #[error("field '{0}' is immutable")]
    ImmutableField(String),

    /// The mutation is empty or cannot be applied
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),
}

impl StorageError {
    pub fn duplicate_key(id: impl Into<String>) -> Self {
        StorageError::DuplicateKey { id: id.into() }
    }

    pub fn invalid_document(reason: impl Into<String>) -> Self {
        StorageError::InvalidDocument(reason.into())
    }

    pub fn immutable_field(field: impl Into<String>) -> Self {
        StorageError::ImmutableField(field.into())
    }

    pub fn invalid_mutation(reason: impl Into<String>) -> Self {
        StorageError::InvalidMutation(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::DuplicateKey { .. } => "FOLIO_DUPLICATE_KEY",
            StorageError::InvalidDocument(_) => "FOLIO_INVALID_DOCUMENT",
            StorageError::ImmutableField(_) => "FOLIO_IMMUTABLE_FIELD",
            StorageError::InvalidMutation(_) => "FOLIO_INVALID_MUTATION",
        }
    }
}

impl From<DocumentError> for StorageError {
    fn from(err: DocumentError) -> Self {
        StorageError::InvalidDocument(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StorageError::duplicate_key("b1").code(), "FOLIO_DUPLICATE_KEY");
        assert_eq!(StorageError::invalid_document("x").code(), "FOLIO_INVALID_DOCUMENT");
        assert_eq!(StorageError::immutable_field("_id").code(), "FOLIO_IMMUTABLE_FIELD");
        assert_eq!(StorageError::invalid_mutation("x").code(), "FOLIO_INVALID_MUTATION");
    }

    #[test]
    fn test_document_error_conversion() {
        let err: StorageError = DocumentError::NotAnObject("[1]".into()).into();
        assert_eq!(err.code(), "FOLIO_INVALID_DOCUMENT");
    }
}
