//! Document storage subsystem for foliodb
//!
//! The store holds the canonical state of all documents, in insertion
//! order, and keeps every secondary index in step with it.
//!
//! # Design Principles
//!
//! - Insertion order is the default result order
//! - `_id` is unique and immutable
//! - Writes are all-or-nothing: validation (including unique index
//!   checks) happens before any state changes
//! - Index maintenance is synchronous

mod errors;
mod mutation;
mod records;
mod store;

pub use errors::{StorageError, StorageResult};
pub use mutation::{FieldOp, Mutation};
pub use records::RecordTable;
pub use store::DocumentStore;
