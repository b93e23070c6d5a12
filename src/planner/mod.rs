//! Query Planner subsystem for foliodb
//!
//! Parses and validates find requests, then chooses how candidates are
//! produced.
//!
//! # Design Principles
//!
//! - Deterministic: same request and indexes give the same plan
//! - Validated upfront: malformed filters, projections and sorts are
//!   rejected before any document is read
//! - Indexes narrow, never decide: the executor re-applies the full
//!   filter to every candidate
//!
//! # Index Selection
//!
//! 1. Usable prefix: contiguous equality fields, then at most one range
//! 2. Longest usable prefix wins
//! 3. Ties broken by index creation order

mod ast;
mod errors;
mod explain;
mod planner;
mod projection;

pub use ast::{FilterOp, Filter, FindRequest, Predicate, SortDirection, SortSpec};
pub use errors::{QueryError, QueryResult};
pub use explain::ExplainPlan;
pub use planner::{IndexAccess, QueryPlan, QueryPlanner, ScanType};
pub use projection::Projection;
