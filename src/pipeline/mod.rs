//! Aggregation pipeline
//!
//! Stages (match, group, sort, limit, skip, project) run in order over a
//! document stream. Pipelines are built either from typed [`Stage`]s or
//! from JSON stage descriptors, and are validated before they run.

mod descriptor;
mod engine;
mod errors;
mod expr;
mod group;
mod stage;

pub use descriptor::StageDescriptor;
pub use engine::Pipeline;
pub use errors::{PipelineError, PipelineResult};
pub use expr::Expr;
pub use stage::{Accumulator, GroupStage, Stage};
