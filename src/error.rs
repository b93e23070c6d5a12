//! Crate-level error type
//!
//! Every subsystem error converts into [`FolioError`] and keeps its own
//! stable `FOLIO_*` code.

use thiserror::Error;

use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::index::IndexError;
use crate::pipeline::PipelineError;
use crate::planner::QueryError;
use crate::storage::StorageError;

/// Any error returned by a foliodb operation
#[derive(Debug, Error)]
pub enum FolioError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FolioError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FolioError::Document(e) => e.code(),
            FolioError::Storage(e) => e.code(),
            FolioError::Index(e) => e.code(),
            FolioError::Query(e) => e.code(),
            FolioError::Pipeline(e) => e.code(),
            FolioError::Config(e) => e.code(),
        }
    }
}

/// Result type for foliodb operations
pub type FolioResult<T> = Result<T, FolioError>;
