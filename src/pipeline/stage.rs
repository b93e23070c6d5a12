//! Pipeline stages
//!
//! Stages compose left to right, each consuming the previous stage's
//! output. Typed stages are built directly or parsed from descriptors.

use crate::document::Document;
use crate::executor::{PredicateFilter, ResultSorter};
use crate::planner::{Filter, Projection, SortSpec};

use super::errors::{PipelineError, PipelineResult};
use super::expr::Expr;
use super::group::run_group;

/// Accumulator applied per group
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Number of documents in the group
    Count,
    /// Sum of numeric values; `Sum(literal 1)` counts
    Sum(Expr),
    /// Running sum / running count, divided at finalize
    Avg(Expr),
    /// Smallest non-null value
    Min(Expr),
    /// Largest non-null value
    Max(Expr),
}

impl Accumulator {
    pub fn op_name(&self) -> &'static str {
        match self {
            Accumulator::Count => "$count",
            Accumulator::Sum(_) => "$sum",
            Accumulator::Avg(_) => "$avg",
            Accumulator::Min(_) => "$min",
            Accumulator::Max(_) => "$max",
        }
    }
}

/// Group stage: key expression plus named accumulators
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStage {
    pub key: Expr,
    /// Output field name and accumulator, in output order
    pub accumulators: Vec<(String, Accumulator)>,
}

impl GroupStage {
    /// Groups by the given key expression
    pub fn by(key: Expr) -> Self {
        Self {
            key,
            accumulators: Vec::new(),
        }
    }

    pub fn accumulate(mut self, name: impl Into<String>, acc: Accumulator) -> Self {
        self.accumulators.push((name.into(), acc));
        self
    }

    pub fn count(self, name: impl Into<String>) -> Self {
        self.accumulate(name, Accumulator::Count)
    }

    pub fn sum(self, name: impl Into<String>, expr: Expr) -> Self {
        self.accumulate(name, Accumulator::Sum(expr))
    }

    pub fn avg(self, name: impl Into<String>, expr: Expr) -> Self {
        self.accumulate(name, Accumulator::Avg(expr))
    }

    pub fn min(self, name: impl Into<String>, expr: Expr) -> Self {
        self.accumulate(name, Accumulator::Min(expr))
    }

    pub fn max(self, name: impl Into<String>, expr: Expr) -> Self {
        self.accumulate(name, Accumulator::Max(expr))
    }

    fn validate(&self) -> PipelineResult<()> {
        for (i, (name, _)) in self.accumulators.iter().enumerate() {
            if name.is_empty() || name == "_id" {
                return Err(PipelineError::invalid_stage(
                    "group",
                    format!("invalid accumulator name '{}'", name),
                ));
            }
            if self.accumulators[..i].iter().any(|(other, _)| other == name) {
                return Err(PipelineError::invalid_stage(
                    "group",
                    format!("accumulator '{}' defined twice", name),
                ));
            }
        }
        Ok(())
    }
}

/// A single pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching the filter
    Match(Filter),
    /// Group documents and compute accumulators
    Group(GroupStage),
    /// Stable multi-key sort
    Sort(Vec<SortSpec>),
    /// Keep the first n documents; n must be positive
    Limit(usize),
    /// Drop the first n documents
    Skip(usize),
    /// Reshape documents
    Project(Projection),
}

impl Stage {
    /// Stage name without the `$` prefix
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "match",
            Stage::Group(_) => "group",
            Stage::Sort(_) => "sort",
            Stage::Limit(_) => "limit",
            Stage::Skip(_) => "skip",
            Stage::Project(_) => "project",
        }
    }

    /// Checks the stage before any document is processed
    pub fn validate(&self) -> PipelineResult<()> {
        match self {
            Stage::Match(filter) => filter.validate()?,
            Stage::Group(group) => group.validate()?,
            Stage::Sort(keys) => {
                if keys.is_empty() {
                    return Err(PipelineError::invalid_stage("sort", "needs at least one key"));
                }
                if keys.iter().any(|k| k.field.is_empty()) {
                    return Err(PipelineError::invalid_stage("sort", "empty field name"));
                }
            }
            Stage::Limit(0) => {
                return Err(PipelineError::invalid_stage("limit", "limit must be positive"))
            }
            Stage::Limit(_) | Stage::Skip(_) | Stage::Project(_) => {}
        }
        Ok(())
    }

    /// Runs the stage over its input
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        match self {
            Stage::Match(filter) => docs
                .into_iter()
                .filter(|doc| PredicateFilter::matches(doc, filter))
                .collect(),
            Stage::Group(group) => run_group(group, docs),
            Stage::Sort(keys) => {
                let mut docs = docs;
                ResultSorter::sort(&mut docs, keys);
                docs
            }
            Stage::Limit(n) => docs.into_iter().take(*n).collect(),
            Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
            Stage::Project(projection) => docs.iter().map(|d| projection.apply(d)).collect(),
        }
    }
}
