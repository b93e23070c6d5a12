//! Explain output for find requests
//!
//! Produces deterministic, human-readable explain output.

use std::fmt;

use super::ast::{FilterOp, FindRequest};
use super::planner::QueryPlan;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainPlan {
    /// "IXSCAN" or "COLLSCAN"
    pub scan_type: String,
    /// Selected index (index scans only)
    pub index: Option<String>,
    /// Filter predicates, one per entry
    pub predicates: Vec<String>,
    /// Sort keys, most significant first
    pub sort: Vec<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    /// Index keys visited
    pub keys_examined: usize,
    /// Documents fetched and tested against the filter
    pub docs_examined: usize,
    /// Documents returned after skip and limit
    pub n_returned: usize,
}

impl ExplainPlan {
    /// Creates an explain plan from a query plan, before execution
    pub fn from_plan(plan: &QueryPlan, request: &FindRequest) -> Self {
        let predicates = request
            .filter
            .predicates()
            .iter()
            .map(|p| format!("{} {} {}", p.field, p.op.op_name(), describe_operand(&p.op)))
            .collect();

        let sort = request
            .sort
            .iter()
            .map(|s| format!("{} {}", s.field, s.direction.as_str()))
            .collect();

        Self {
            scan_type: plan.scan_type.as_str().to_string(),
            index: plan.index.clone(),
            predicates,
            sort,
            skip: request.skip.filter(|&s| s > 0),
            limit: request.effective_limit(),
            keys_examined: plan.keys_examined,
            docs_examined: 0,
            n_returned: 0,
        }
    }

    /// Records execution statistics
    pub fn with_execution(mut self, docs_examined: usize, n_returned: usize) -> Self {
        self.docs_examined = docs_examined;
        self.n_returned = n_returned;
        self
    }

    pub fn uses_index(&self, name: &str) -> bool {
        self.index.as_deref() == Some(name)
    }
}

fn describe_operand(op: &FilterOp) -> String {
    match op {
        FilterOp::Eq(v)
        | FilterOp::Ne(v)
        | FilterOp::Gt(v)
        | FilterOp::Gte(v)
        | FilterOp::Lt(v)
        | FilterOp::Lte(v) => v.to_json().to_string(),
        FilterOp::In(values) => {
            let items: Vec<String> = values.iter().map(|v| v.to_json().to_string()).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Scan Type: {}", self.scan_type)?;
        if let Some(idx) = &self.index {
            writeln!(f, "Index: {}", idx)?;
        }
        if !self.predicates.is_empty() {
            writeln!(f, "Predicates:")?;
            for pred in &self.predicates {
                writeln!(f, "  - {}", pred)?;
            }
        }
        if !self.sort.is_empty() {
            writeln!(f, "Sort: {}", self.sort.join(", "))?;
        }
        if let Some(skip) = self.skip {
            writeln!(f, "Skip: {}", skip)?;
        }
        if let Some(limit) = self.limit {
            writeln!(f, "Limit: {}", limit)?;
        }
        writeln!(f, "Keys Examined: {}", self.keys_examined)?;
        writeln!(f, "Docs Examined: {}", self.docs_examined)?;
        writeln!(f, "Returned: {}", self.n_returned)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::planner::{Filter, ScanType, SortSpec};

    fn index_plan() -> QueryPlan {
        QueryPlan {
            scan_type: ScanType::IndexScan,
            index: Some("author_1_published_year_-1".into()),
            candidates: Some(vec![DocumentId::from("b1"), DocumentId::from("b2")]),
            keys_examined: 2,
        }
    }

    #[test]
    fn test_explain_index_scan() {
        let request = FindRequest::new(
            Filter::all()
                .eq("author", "George Orwell")
                .gt("published_year", 1940),
        )
        .with_sort(SortSpec::desc("published_year"))
        .with_limit(10);

        let explain = ExplainPlan::from_plan(&index_plan(), &request).with_execution(2, 2);

        assert_eq!(explain.scan_type, "IXSCAN");
        assert!(explain.uses_index("author_1_published_year_-1"));
        assert_eq!(explain.predicates[0], "author eq \"George Orwell\"");
        assert_eq!(explain.predicates[1], "published_year gt 1940");
        assert_eq!(explain.limit, Some(10));

        let output = format!("{}", explain);
        assert!(output.contains("=== EXPLAIN PLAN ==="));
        assert!(output.contains("Scan Type: IXSCAN"));
        assert!(output.contains("Sort: published_year desc"));
        assert!(output.contains("Returned: 2"));
    }

    #[test]
    fn test_explain_collection_scan() {
        let request = FindRequest::new(Filter::all().ne("genre", "Romance")).with_limit(0);
        let explain = ExplainPlan::from_plan(&QueryPlan::collection_scan(), &request);

        assert_eq!(explain.scan_type, "COLLSCAN");
        assert!(explain.index.is_none());
        assert!(explain.limit.is_none());
        assert!(!format!("{}", explain).contains("Index:"));
    }

    #[test]
    fn test_explain_deterministic() {
        let request = FindRequest::new(Filter::all().eq("author", "George Orwell"));
        let a = format!("{}", ExplainPlan::from_plan(&index_plan(), &request));
        let b = format!("{}", ExplainPlan::from_plan(&index_plan(), &request));
        assert_eq!(a, b);
    }
}
