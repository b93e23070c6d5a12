//! Pipeline engine
//!
//! A pipeline is validated as a whole when it is built. Running it never
//! fails: stages only reshape, filter or reorder documents.

use crate::document::Document;
use crate::planner::Filter;

use super::descriptor::StageDescriptor;
use super::errors::{PipelineError, PipelineResult};
use super::stage::Stage;

/// Ordered list of validated stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Validates every stage and builds the pipeline
    pub fn new(stages: Vec<Stage>) -> PipelineResult<Self> {
        for stage in &stages {
            stage.validate()?;
        }
        Ok(Self { stages })
    }

    pub fn from_descriptors(descriptors: &[StageDescriptor]) -> PipelineResult<Self> {
        let stages = descriptors
            .iter()
            .map(StageDescriptor::to_stage)
            .collect::<PipelineResult<Vec<_>>>()?;
        Self::new(stages)
    }

    /// Parses a JSON array of single-key stage objects
    pub fn from_json(raw: &serde_json::Value) -> PipelineResult<Self> {
        let serde_json::Value::Array(items) = raw else {
            return Err(PipelineError::invalid_stage(
                "pipeline",
                format!("pipeline must be an array, got {}", raw),
            ));
        };
        let descriptors = items
            .iter()
            .map(StageDescriptor::parse)
            .collect::<PipelineResult<Vec<_>>>()?;
        Self::from_descriptors(&descriptors)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Filter of the first stage when it is a match.
    ///
    /// Only a leading match can be answered from an index; later matches
    /// see documents produced by earlier stages.
    pub fn leading_match(&self) -> Option<&Filter> {
        match self.stages.first() {
            Some(Stage::Match(filter)) => Some(filter),
            _ => None,
        }
    }

    /// Runs every stage over `input`
    pub fn run(&self, input: Vec<Document>) -> Vec<Document> {
        Self::run_stages(&self.stages, input)
    }

    /// Runs the stages after a leading match whose output is `matched`
    pub fn run_after_leading_match(&self, matched: Vec<Document>) -> Vec<Document> {
        let rest = match self.leading_match() {
            Some(_) => &self.stages[1..],
            None => &self.stages[..],
        };
        Self::run_stages(rest, matched)
    }

    fn run_stages(stages: &[Stage], input: Vec<Document>) -> Vec<Document> {
        stages.iter().fold(input, |docs, stage| stage.apply(docs))
    }
}
