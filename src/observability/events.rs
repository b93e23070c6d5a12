//! Observability events for foliodb
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded from a file
    ConfigLoaded,

    // Index operations
    /// Index build started
    IndexBuildStart,
    /// Index build complete
    IndexBuildComplete,
    /// Index build aborted by a unique violation
    IndexBuildFailed,
    /// Index dropped
    IndexDropped,

    // Query operations
    /// Find request planned
    QueryPlanned,
    /// Find request rejected during validation
    QueryRejected,

    // Write operations
    /// Insert, update or delete rejected
    WriteRejected,

    // Pipeline operations
    /// Pipeline ran to completion
    PipelineExecuted,
    /// Pipeline rejected during validation
    PipelineRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::IndexBuildStart => "INDEX_BUILD_BEGIN",
            Event::IndexBuildComplete => "INDEX_BUILD_COMPLETE",
            Event::IndexBuildFailed => "INDEX_BUILD_FAILED",
            Event::IndexDropped => "INDEX_DROPPED",

            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryRejected => "QUERY_REJECTED",

            Event::WriteRejected => "WRITE_REJECTED",

            Event::PipelineExecuted => "PIPELINE_COMPLETE",
            Event::PipelineRejected => "PIPELINE_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryPlanned | Event::PipelineExecuted => Severity::Trace,
            Event::IndexBuildFailed
            | Event::QueryRejected
            | Event::WriteRejected
            | Event::PipelineRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
