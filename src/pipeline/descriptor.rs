//! Stage descriptors
//!
//! A descriptor is the untyped form of a stage: a name and a JSON body,
//! e.g. `{"$group": {"_id": "$genre", "count": {"$sum": 1}}}`. Names are
//! accepted with or without the leading `$`.

use crate::planner::{Filter, Projection, SortSpec};

use super::errors::{PipelineError, PipelineResult};
use super::expr::Expr;
use super::stage::{Accumulator, GroupStage, Stage};

/// Untyped stage: name plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct StageDescriptor {
    pub name: String,
    pub body: serde_json::Value,
}

impl StageDescriptor {
    pub fn new(name: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    /// Parses a single-key object such as `{"$limit": 5}`
    pub fn parse(raw: &serde_json::Value) -> PipelineResult<Self> {
        let serde_json::Value::Object(map) = raw else {
            return Err(PipelineError::invalid_stage(
                "pipeline",
                format!("stage must be an object, got {}", raw),
            ));
        };
        if map.len() != 1 {
            return Err(PipelineError::invalid_stage(
                "pipeline",
                format!("stage object must have exactly one key, got {}", map.len()),
            ));
        }
        let Some((name, body)) = map.iter().next() else {
            return Err(PipelineError::invalid_stage("pipeline", "empty stage object"));
        };
        Ok(Self::new(name.clone(), body.clone()))
    }

    /// Stage name without the `$` prefix
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('$').unwrap_or(&self.name)
    }

    /// Converts the descriptor into a typed stage
    pub fn to_stage(&self) -> PipelineResult<Stage> {
        let stage = match self.bare_name() {
            "match" => Stage::Match(Filter::from_json(&self.body)?),
            "group" => Stage::Group(parse_group(&self.body)?),
            "sort" => Stage::Sort(SortSpec::list_from_json(&self.body)?),
            "limit" => Stage::Limit(self.count_body("limit", 1)?),
            "skip" => Stage::Skip(self.count_body("skip", 0)?),
            "project" => Stage::Project(Projection::from_json(&self.body)?),
            _ => return Err(PipelineError::unknown_stage(self.name.clone())),
        };
        stage.validate()?;
        Ok(stage)
    }

    fn count_body(&self, stage: &str, min: u64) -> PipelineResult<usize> {
        let n = self
            .body
            .as_u64()
            .or_else(|| {
                self.body
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .filter(|&n| n >= min)
            .ok_or_else(|| {
                let expected = if min > 0 { "a positive" } else { "a non-negative" };
                PipelineError::invalid_stage(
                    stage,
                    format!("expected {} integer, got {}", expected, self.body),
                )
            })?;
        usize::try_from(n).map_err(|_| PipelineError::invalid_stage(stage, "count too large"))
    }
}

fn parse_group(body: &serde_json::Value) -> PipelineResult<GroupStage> {
    let serde_json::Value::Object(map) = body else {
        return Err(PipelineError::invalid_stage(
            "group",
            format!("body must be an object, got {}", body),
        ));
    };
    let key = map
        .get("_id")
        .ok_or_else(|| PipelineError::invalid_stage("group", "missing _id"))?;
    let key = Expr::from_json(key).map_err(|reason| PipelineError::invalid_stage("group", reason))?;

    let mut group = GroupStage::by(key);
    for (name, spec) in map.iter().filter(|(name, _)| name.as_str() != "_id") {
        group = group.accumulate(name.clone(), parse_accumulator(name, spec)?);
    }
    Ok(group)
}

fn parse_accumulator(name: &str, spec: &serde_json::Value) -> PipelineResult<Accumulator> {
    let invalid = |reason: String| PipelineError::invalid_stage("group", reason);

    let serde_json::Value::Object(map) = spec else {
        return Err(invalid(format!(
            "accumulator '{}' must be an object like {{\"$sum\": 1}}",
            name
        )));
    };
    let (op, arg) = match (map.len(), map.iter().next()) {
        (1, Some(entry)) => entry,
        _ => {
            return Err(invalid(format!(
                "accumulator '{}' must have exactly one operator",
                name
            )))
        }
    };

    let expr = || Expr::from_json(arg).map_err(|reason| invalid(format!("{}: {}", name, reason)));
    match op.as_str() {
        "$count" => Ok(Accumulator::Count),
        "$sum" => Ok(Accumulator::Sum(expr()?)),
        "$avg" => Ok(Accumulator::Avg(expr()?)),
        "$min" => Ok(Accumulator::Min(expr()?)),
        "$max" => Ok(Accumulator::Max(expr()?)),
        other => Err(invalid(format!(
            "unknown accumulator '{}' for '{}'",
            other, name
        ))),
    }
}
