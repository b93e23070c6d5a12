//! Pipeline error types
//!
//! Error codes:
//! - FOLIO_UNKNOWN_STAGE
//! - FOLIO_INVALID_STAGE
//! - codes of wrapped query errors
//!
//! Pipelines are validated as a whole before any document is processed.

use thiserror::Error;

use crate::planner::QueryError;

/// Pipeline construction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Stage name is not one of match, group, sort, limit, skip, project
    #[error("unknown pipeline stage: {0}")]
    UnknownStage(String),

    /// Stage body is malformed
    #[error("invalid {stage} stage: {reason}")]
    InvalidStage { stage: String, reason: String },

    /// A match filter, sort or projection failed validation
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl PipelineError {
    pub fn unknown_stage(name: impl Into<String>) -> Self {
        PipelineError::UnknownStage(name.into())
    }

    pub fn invalid_stage(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::InvalidStage {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::UnknownStage(_) => "FOLIO_UNKNOWN_STAGE",
            PipelineError::InvalidStage { .. } => "FOLIO_INVALID_STAGE",
            PipelineError::Query(err) => err.code(),
        }
    }
}

/// Result type for pipeline construction
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PipelineError::unknown_stage("$lookup").code(), "FOLIO_UNKNOWN_STAGE");
        assert_eq!(
            PipelineError::invalid_stage("limit", "must be positive").code(),
            "FOLIO_INVALID_STAGE"
        );
        let wrapped: PipelineError = QueryError::invalid_projection("mixed").into();
        assert_eq!(wrapped.code(), "FOLIO_INVALID_PROJECTION");
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::invalid_stage("group", "missing _id");
        assert_eq!(err.to_string(), "invalid group stage: missing _id");
    }
}
