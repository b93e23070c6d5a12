//! Index Manager subsystem for foliodb
//!
//! Indexes are derived, in-memory state kept in step with the document
//! store on every write.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror the store, never the source of truth
//! - Back-references only: indexes hold document identifiers
//! - Deterministic: BTreeMap iteration order
//!
//! # Invariants
//!
//! - No stale entries after insert, update or delete
//! - A compound index serves only a contiguous equality prefix plus at
//!   most one trailing range
//! - Selection prefers the longest usable prefix, then creation order

mod bounds;
mod btree;
mod errors;
mod manager;
mod spec;

pub use bounds::IndexBounds;
pub use btree::{CompositeKey, IndexTree, KeyPart, KeyScan, KeySlot, NumberKey};
pub use errors::{IndexError, IndexResult};
pub use manager::{DuplicateIndexPolicy, IndexInfo, IndexLookup, IndexManager, IndexScan};
pub use spec::{IndexField, IndexSpec};
