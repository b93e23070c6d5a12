//! Lazy, restartable result cursors
//!
//! The plan, including any index lookup, is chosen when the cursor is
//! created; index usage and scan metrics are counted then. Documents are
//! read only from the first `next()`. Without a sort the cursor streams:
//! filtering, skip and limit run one document at a time. With a sort
//! every match is collected first.
//!
//! `rewind()` replays the same plan from the first result. A cursor
//! borrows its store, so no write can happen while it is alive.

use crate::document::Document;
use crate::planner::{FindRequest, QueryPlan};

use super::executor::{candidate_documents, DocumentSource};
use super::filters::PredicateFilter;
use super::sorter::ResultSorter;

type DocIter<'a> = Box<dyn Iterator<Item = &'a Document> + 'a>;

/// Lazy sequence of documents matching a find request
pub struct Cursor<'a> {
    source: &'a dyn DocumentSource,
    plan: QueryPlan,
    request: FindRequest,
    pending: Option<DocIter<'a>>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a dyn DocumentSource, plan: QueryPlan, request: FindRequest) -> Self {
        Self {
            source,
            plan,
            request,
            pending: None,
        }
    }

    /// The plan this cursor executes
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Restarts the cursor from the first result
    pub fn rewind(&mut self) {
        self.pending = None;
    }

    fn start(&self) -> DocIter<'a> {
        let source = self.source;
        let filter = self.request.filter.clone();

        let matched: DocIter<'a> = match &self.plan.candidates {
            Some(_) => Box::new(
                candidate_documents(source, &self.plan)
                    .into_iter()
                    .filter(move |doc| PredicateFilter::matches(doc, &filter)),
            ),
            None => Box::new(
                source
                    .scan()
                    .filter(move |doc| PredicateFilter::matches(doc, &filter)),
            ),
        };

        let ordered: DocIter<'a> = if self.request.sort.is_empty() {
            matched
        } else {
            let mut all: Vec<&'a Document> = matched.collect();
            ResultSorter::sort(&mut all, &self.request.sort);
            Box::new(all.into_iter())
        };

        let skipped = ordered.skip(self.request.skip.unwrap_or(0));
        match self.request.effective_limit() {
            Some(limit) => Box::new(skipped.take(limit)),
            None => Box::new(skipped),
        }
    }
}

impl Iterator for Cursor<'_> {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        if self.pending.is_none() {
            self.pending = Some(self.start());
        }
        let doc = self.pending.as_mut()?.next()?;
        Some(match &self.request.projection {
            Some(projection) => projection.apply(doc),
            None => doc.clone(),
        })
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("plan", &self.plan)
            .field("started", &self.pending.is_some())
            .finish()
    }
}
