//! Query Executor subsystem for foliodb
//!
//! Consumes query plans and produces deterministic results.
//!
//! # Execution Flow (strict order)
//!
//! 1. Candidates from the chosen index, or a full collection scan
//! 2. Full filter applied to every candidate
//! 3. Sort (stable, multi-key)
//! 4. Skip, then limit
//! 5. Projection
//!
//! # Invariants
//!
//! - Deterministic: same request and data give the same ordered results
//! - Index results equal full-scan results for every filter

mod cursor;
mod executor;
mod filters;
mod result;
mod sorter;

pub use cursor::Cursor;
pub use executor::{DocumentSource, QueryExecutor};
pub use filters::PredicateFilter;
pub use result::ExecutionResult;
pub use sorter::ResultSorter;
