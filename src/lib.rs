//! foliodb - A deterministic, embedded document query engine
//!
//! In-memory documents with filter predicates, projections, sorting,
//! pagination, secondary indexes and an aggregation pipeline.
//!
//! ```ignore
//! use foliodb::{DocumentStore, Filter, FindRequest, IndexSpec, SortSpec};
//!
//! let mut store = DocumentStore::new();
//! store.insert_json(&serde_json::json!({"title": "Dune", "author": "Frank Herbert"}))?;
//! store.create_index(IndexSpec::new().asc("author").desc("published_year"))?;
//!
//! let request = FindRequest::new(Filter::all().eq("author", "Frank Herbert"))
//!     .with_sort(SortSpec::desc("published_year"));
//! let books: Vec<_> = store.find(request)?.collect();
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod index;
pub mod observability;
pub mod pipeline;
pub mod planner;
pub mod storage;

pub use config::{ConfigError, EngineConfig};
pub use document::{Document, DocumentId, Value, ID_FIELD};
pub use error::{FolioError, FolioResult};
pub use executor::{Cursor, ExecutionResult};
pub use index::{DuplicateIndexPolicy, IndexInfo, IndexSpec};
pub use pipeline::{Accumulator, Expr, GroupStage, Pipeline, Stage, StageDescriptor};
pub use planner::{ExplainPlan, Filter, FindRequest, Projection, ScanType, SortSpec};
pub use storage::{DocumentStore, Mutation};
