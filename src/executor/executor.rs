//! Query executor for foliodb
//!
//! Executes find requests against a document source, producing
//! deterministic results.
//!
//! Execution flow (strict order):
//! 1. Ask the index layer for candidates
//! 2. Fetch candidates in store order, or scan the whole collection
//! 3. Re-apply the full filter to every document
//! 4. Sort (if specified)
//! 5. Skip, then limit
//! 6. Project
//!
//! Sorting runs on full documents, so a sort key may be projected away.

use crate::document::{Document, DocumentId};
use crate::planner::{
    ExplainPlan, Filter, FindRequest, IndexAccess, QueryPlan, QueryPlanner, QueryResult,
};

use super::cursor::Cursor;
use super::filters::PredicateFilter;
use super::result::ExecutionResult;
use super::sorter::ResultSorter;

/// Read access to stored documents
pub trait DocumentSource {
    /// Fetch a document by identifier
    fn fetch(&self, id: &DocumentId) -> Option<&Document>;

    /// Position of a document in store iteration order
    fn position(&self, id: &DocumentId) -> Option<u64>;

    /// All documents in store iteration order
    fn scan(&self) -> Box<dyn Iterator<Item = &Document> + '_>;
}

/// Query executor that processes find requests against a source
pub struct QueryExecutor<'a, S: DocumentSource, I: IndexAccess + ?Sized> {
    source: &'a S,
    indexes: &'a I,
}

impl<'a, S: DocumentSource, I: IndexAccess + ?Sized> QueryExecutor<'a, S, I> {
    /// Creates a new executor
    pub fn new(source: &'a S, indexes: &'a I) -> Self {
        Self { source, indexes }
    }

    /// Validates and plans a request
    pub fn plan(&self, request: &FindRequest) -> QueryResult<QueryPlan> {
        QueryPlanner::new(self.indexes).plan(request)
    }

    /// Executes a request eagerly.
    ///
    /// Same request and same data give the same results in the same order.
    pub fn execute(&self, request: &FindRequest) -> QueryResult<ExecutionResult> {
        let plan = self.plan(request)?;
        Ok(self.execute_plan(&plan, request))
    }

    /// Executes an already validated plan
    pub fn execute_plan(&self, plan: &QueryPlan, request: &FindRequest) -> ExecutionResult {
        let candidates = candidate_documents(self.source, plan);
        let docs_examined = candidates.len();

        let mut matched: Vec<&Document> = candidates
            .into_iter()
            .filter(|doc| PredicateFilter::matches(doc, &request.filter))
            .collect();

        ResultSorter::sort(&mut matched, &request.sort);

        let skip = request.skip.unwrap_or(0);
        let limit = request.effective_limit().unwrap_or(usize::MAX);
        let documents: Vec<Document> = matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| match &request.projection {
                Some(projection) => projection.apply(doc),
                None => doc.clone(),
            })
            .collect();

        ExecutionResult {
            scan_type: plan.scan_type,
            index: plan.index.clone(),
            keys_examined: plan.keys_examined,
            docs_examined,
            n_returned: documents.len(),
            documents,
        }
    }

    /// Creates a lazy, restartable cursor for the request
    pub fn cursor(&self, request: FindRequest) -> QueryResult<Cursor<'a>> {
        let plan = self.plan(&request)?;
        Ok(Cursor::new(self.source, plan, request))
    }

    /// Executes the request and reports how it ran
    pub fn explain(&self, request: &FindRequest) -> QueryResult<ExplainPlan> {
        let plan = self.plan(request)?;
        let result = self.execute_plan(&plan, request);
        Ok(ExplainPlan::from_plan(&plan, request)
            .with_execution(result.docs_examined, result.n_returned))
    }

    /// Identifiers of all documents matching the filter, in store order.
    ///
    /// Uses an index when one applies.
    pub fn matching_ids(&self, filter: &Filter) -> QueryResult<Vec<DocumentId>> {
        filter.validate()?;
        let plan = QueryPlanner::new(self.indexes).plan_filter(filter, None);
        Ok(candidate_documents(self.source, &plan)
            .into_iter()
            .filter(|doc| PredicateFilter::matches(doc, filter))
            .filter_map(|doc| doc.id().map(DocumentId::from))
            .collect())
    }
}

/// Fetches the plan's candidates in store iteration order.
///
/// Identifiers the source no longer holds are skipped.
pub(crate) fn candidate_documents<'s, S: DocumentSource + ?Sized>(
    source: &'s S,
    plan: &QueryPlan,
) -> Vec<&'s Document> {
    match &plan.candidates {
        Some(ids) => {
            let mut found: Vec<(u64, &Document)> = ids
                .iter()
                .filter_map(|id| Some((source.position(id)?, source.fetch(id)?)))
                .collect();
            found.sort_by_key(|(pos, _)| *pos);
            found.into_iter().map(|(_, doc)| doc).collect()
        }
        None => source.scan().collect(),
    }
}
