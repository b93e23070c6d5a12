//! Result types for query execution

use crate::document::Document;
use crate::planner::ScanType;

/// Result of query execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Documents in result order, projected
    pub documents: Vec<Document>,
    /// Scan used to produce candidates
    pub scan_type: ScanType,
    /// Index used, if any
    pub index: Option<String>,
    /// Index keys visited
    pub keys_examined: usize,
    /// Documents fetched and tested against the filter
    pub docs_examined: usize,
    /// Documents returned
    pub n_returned: usize,
}

impl ExecutionResult {
    /// Creates an empty result
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            scan_type: ScanType::CollectionScan,
            index: None,
            keys_examined: 0,
            docs_examined: 0,
            n_returned: 0,
        }
    }

    /// Returns true if no documents matched
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the number of results
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns an iterator over the documents
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Returns true if the named index produced the candidates
    pub fn used_index(&self, name: &str) -> bool {
        self.index.as_deref() == Some(name)
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}
