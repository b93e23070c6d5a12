//! Query planner
//!
//! Chooses between an index scan and a collection scan for a find request.
//!
//! Selection order:
//! 1. A hinted index, if the filter can use it
//! 2. The index with the longest usable key prefix
//! 3. Earliest created index on ties
//!
//! Planning is deterministic: the same request against the same indexes
//! always produces the same plan.

use crate::document::DocumentId;
use crate::index::{IndexLookup, IndexSpec};

use super::ast::{Filter, FindRequest};
use super::errors::QueryResult;

/// Scan type used by a query plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    /// Candidates come from a secondary index
    IndexScan,
    /// Every stored document is a candidate
    CollectionScan,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::IndexScan => "IXSCAN",
            ScanType::CollectionScan => "COLLSCAN",
        }
    }
}

/// Read access to secondary indexes used during planning
pub trait IndexAccess {
    /// Candidates from the best usable index
    fn lookup(&self, filter: &Filter) -> IndexLookup;

    /// Candidates from the index with the given key pattern
    fn lookup_on(&self, spec: &IndexSpec, filter: &Filter) -> IndexLookup;
}

/// Immutable query plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub scan_type: ScanType,
    /// Name of the chosen index
    pub index: Option<String>,
    /// Index candidates; None means scan the collection
    pub candidates: Option<Vec<DocumentId>>,
    /// Index keys visited while producing candidates
    pub keys_examined: usize,
}

impl QueryPlan {
    /// Plan that visits every document
    pub fn collection_scan() -> Self {
        Self {
            scan_type: ScanType::CollectionScan,
            index: None,
            candidates: None,
            keys_examined: 0,
        }
    }

    pub fn is_index_scan(&self) -> bool {
        self.scan_type == ScanType::IndexScan
    }
}

impl From<IndexLookup> for QueryPlan {
    fn from(lookup: IndexLookup) -> Self {
        match lookup {
            IndexLookup::Candidates(scan) => Self {
                scan_type: ScanType::IndexScan,
                index: Some(scan.index),
                candidates: Some(scan.ids),
                keys_examined: scan.keys_examined,
            },
            IndexLookup::NoIndex => Self::collection_scan(),
        }
    }
}

/// Query planner over a set of secondary indexes
pub struct QueryPlanner<'a, I: IndexAccess + ?Sized> {
    indexes: &'a I,
}

impl<'a, I: IndexAccess + ?Sized> QueryPlanner<'a, I> {
    pub fn new(indexes: &'a I) -> Self {
        Self { indexes }
    }

    /// Plans a find request.
    ///
    /// The request is validated first; an invalid request never reaches
    /// the indexes.
    pub fn plan(&self, request: &FindRequest) -> QueryResult<QueryPlan> {
        request.validate()?;
        Ok(self.plan_filter(&request.filter, request.hint.as_ref()))
    }

    /// Plans a bare filter with an optional index hint.
    ///
    /// A hint the filter cannot use falls back to normal selection.
    pub fn plan_filter(&self, filter: &Filter, hint: Option<&IndexSpec>) -> QueryPlan {
        if filter.is_empty() {
            return QueryPlan::collection_scan();
        }

        if let Some(spec) = hint {
            let lookup = self.indexes.lookup_on(spec, filter);
            if lookup.is_index_scan() {
                return lookup.into();
            }
        }

        self.indexes.lookup(filter).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexScan;

    /// Single-index stub keyed on one field
    struct StubIndexes {
        field: &'static str,
        name: &'static str,
    }

    impl StubIndexes {
        fn scan(&self, filter: &Filter) -> IndexLookup {
            if filter.predicates().iter().any(|p| p.field == self.field) {
                IndexLookup::Candidates(IndexScan {
                    index: self.name.to_string(),
                    ids: vec![DocumentId::from("b1")],
                    keys_examined: 1,
                    prefix_len: 1,
                })
            } else {
                IndexLookup::NoIndex
            }
        }
    }

    impl IndexAccess for StubIndexes {
        fn lookup(&self, filter: &Filter) -> IndexLookup {
            self.scan(filter)
        }

        fn lookup_on(&self, spec: &IndexSpec, filter: &Filter) -> IndexLookup {
            if spec.covers(self.field) {
                self.scan(filter)
            } else {
                IndexLookup::NoIndex
            }
        }
    }

    fn stub() -> StubIndexes {
        StubIndexes {
            field: "author",
            name: "author_1",
        }
    }

    #[test]
    fn test_plan_index_scan() {
        let indexes = stub();
        let planner = QueryPlanner::new(&indexes);
        let request = FindRequest::new(Filter::all().eq("author", "George Orwell"));

        let plan = planner.plan(&request).unwrap();
        assert_eq!(plan.scan_type, ScanType::IndexScan);
        assert_eq!(plan.index.as_deref(), Some("author_1"));
        assert_eq!(plan.candidates.map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_plan_collection_scan() {
        let indexes = stub();
        let planner = QueryPlanner::new(&indexes);

        let plan = planner
            .plan(&FindRequest::new(Filter::all().eq("genre", "Fiction")))
            .unwrap();
        assert_eq!(plan.scan_type.as_str(), "COLLSCAN");
        assert!(plan.candidates.is_none());

        let plan = planner.plan(&FindRequest::all()).unwrap();
        assert_eq!(plan, QueryPlan::collection_scan());
    }

    #[test]
    fn test_unusable_hint_falls_back() {
        let indexes = stub();
        let planner = QueryPlanner::new(&indexes);
        let request = FindRequest::new(Filter::all().eq("author", "George Orwell"))
            .with_hint(IndexSpec::new().asc("price"));

        let plan = planner.plan(&request).unwrap();
        assert!(plan.is_index_scan());
    }

    #[test]
    fn test_invalid_request_rejected() {
        let indexes = stub();
        let planner = QueryPlanner::new(&indexes);
        let request = FindRequest::new(Filter::all().gt("price", Option::<i64>::None));

        let err = planner.plan(&request).unwrap_err();
        assert_eq!(err.code(), "FOLIO_INVALID_PREDICATE");
    }

    #[test]
    fn test_plan_deterministic() {
        let indexes = stub();
        let planner = QueryPlanner::new(&indexes);
        let request = FindRequest::new(Filter::all().eq("author", "Frank Herbert"));

        assert_eq!(planner.plan(&request).unwrap(), planner.plan(&request).unwrap());
    }
}
