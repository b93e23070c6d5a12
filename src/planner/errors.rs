//! Query request errors
//!
//! Error codes:
//! - FOLIO_INVALID_PREDICATE
//! - FOLIO_INVALID_PROJECTION
//! - FOLIO_INVALID_SORT
//!
//! All are raised during request validation, before any document is read.

use thiserror::Error;

/// Errors in a find request, filter, projection or sort
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Malformed comparison
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    /// Mixed inclusion and exclusion, or a malformed projection value
    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    /// Malformed sort specification
    #[error("invalid sort: {0}")]
    InvalidSort(String),
}

impl QueryError {
    pub fn invalid_predicate(reason: impl Into<String>) -> Self {
        QueryError::InvalidPredicate(reason.into())
    }

    pub fn invalid_projection(reason: impl Into<String>) -> Self {
        QueryError::InvalidProjection(reason.into())
    }

    pub fn invalid_sort(reason: impl Into<String>) -> Self {
        QueryError::InvalidSort(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidPredicate(_) => "FOLIO_INVALID_PREDICATE",
            QueryError::InvalidProjection(_) => "FOLIO_INVALID_PROJECTION",
            QueryError::InvalidSort(_) => "FOLIO_INVALID_SORT",
        }
    }
}

/// Result type for request validation
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            QueryError::invalid_predicate("x").code(),
            "FOLIO_INVALID_PREDICATE"
        );
        assert_eq!(
            QueryError::invalid_projection("x").code(),
            "FOLIO_INVALID_PROJECTION"
        );
        assert_eq!(QueryError::invalid_sort("x").code(), "FOLIO_INVALID_SORT");
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::invalid_projection("cannot mix inclusion and exclusion");
        assert_eq!(
            err.to_string(),
            "invalid projection: cannot mix inclusion and exclusion"
        );
    }
}
