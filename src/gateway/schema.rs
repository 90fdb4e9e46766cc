//! Reply schemas: each pairs a canonical artifact struct with structural checks.

use crate::error::SchemaViolation;
use crate::lesson::report::COMPLIANCE_THRESHOLD;
use crate::lesson::{
    CognitiveLevel, Grouping, PlanDraft, ReviewDraft, RubricKind, UnitBatch, ValidationReport,
};
use serde::de::DeserializeOwned;
use std::collections::HashSet;

/// A reply schema. Deserializing into `Artifact` checks shape; `validate` checks the rest.
pub trait Schema: Send + Sync {
    type Artifact: DeserializeOwned + Send;

    fn name(&self) -> &'static str;

    fn validate(&self, artifact: &Self::Artifact) -> Result<(), SchemaViolation>;
}

/// Strips a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parses and validates a raw reply.
pub fn decode<S: Schema>(schema: &S, raw: &str) -> Result<S::Artifact, SchemaViolation> {
    let artifact: S::Artifact = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| SchemaViolation::new(format!("invalid JSON for {}: {}", schema.name(), e)))?;
    schema.validate(&artifact)?;
    Ok(artifact)
}

fn require(condition: bool, message: impl FnOnce() -> String) -> Result<(), SchemaViolation> {
    if condition {
        Ok(())
    } else {
        Err(SchemaViolation::new(message()))
    }
}

/// Plan reply: overview, objectives covering every selected level, nine grouping entries.
pub struct PlanSchema {
    levels: Vec<CognitiveLevel>,
}

impl PlanSchema {
    pub fn new(levels: &[CognitiveLevel]) -> Self {
        Self {
            levels: levels.to_vec(),
        }
    }
}

impl Schema for PlanSchema {
    type Artifact = PlanDraft;

    fn name(&self) -> &'static str {
        "plan"
    }

    fn validate(&self, draft: &PlanDraft) -> Result<(), SchemaViolation> {
        require(!draft.overview.title.trim().is_empty(), || {
            "overview.title is empty".to_string()
        })?;

        for level in &self.levels {
            require(
                draft.objectives.iter().any(|o| o.level == *level),
                || format!("no objective for cognitive level '{}'", level),
            )?;
        }
        require(
            draft.objectives.iter().all(|o| !o.statement.trim().is_empty()),
            || "objective with empty statement".to_string(),
        )?;

        require(draft.groupings.len() == Grouping::COUNT, || {
            format!(
                "expected {} grouping entries, got {}",
                Grouping::COUNT,
                draft.groupings.len()
            )
        })?;
        let numbers: HashSet<u8> = draft.groupings.iter().map(|g| g.number).collect();
        for grouping in Grouping::ALL {
            require(numbers.contains(&grouping.number()), || {
                format!("missing grouping {}", grouping.number())
            })?;
        }
        require(
            draft.groupings.iter().all(|g| !g.activities.is_empty()),
            || "grouping entry without activities".to_string(),
        )?;
        Ok(())
    }
}

/// Content reply for one grouping.
pub struct UnitBatchSchema {
    grouping: Grouping,
    max_minutes: u32,
}

impl UnitBatchSchema {
    pub fn new(grouping: Grouping, max_minutes: u32) -> Self {
        Self {
            grouping,
            max_minutes,
        }
    }
}

impl Schema for UnitBatchSchema {
    type Artifact = UnitBatch;

    fn name(&self) -> &'static str {
        "unit_batch"
    }

    fn validate(&self, batch: &UnitBatch) -> Result<(), SchemaViolation> {
        require(!batch.units.is_empty(), || {
            format!("no units for grouping {}", self.grouping.number())
        })?;
        let max = f64::from(self.max_minutes);
        for (index, unit) in batch.units.iter().enumerate() {
            require(!unit.title.trim().is_empty(), || {
                format!("unit {} has an empty title", index)
            })?;
            require(!unit.body.trim().is_empty(), || {
                format!("unit {} has an empty body", index)
            })?;
            require(
                unit.duration_minutes.is_finite()
                    && unit.duration_minutes > 0.0
                    && unit.duration_minutes <= max,
                || {
                    format!(
                        "unit {} duration {} outside (0, {}]",
                        index, unit.duration_minutes, self.max_minutes
                    )
                },
            )?;
        }
        Ok(())
    }
}

/// Review reply: recommendations only, scores are computed locally.
pub struct ReviewSchema {
    rubric: RubricKind,
}

impl ReviewSchema {
    pub fn new(rubric: RubricKind) -> Self {
        Self { rubric }
    }
}

impl Schema for ReviewSchema {
    type Artifact = ReviewDraft;

    fn name(&self) -> &'static str {
        "review"
    }

    fn validate(&self, draft: &ReviewDraft) -> Result<(), SchemaViolation> {
        for recommendation in &draft.recommendations {
            require(!recommendation.text.trim().is_empty(), || {
                format!("{} recommendation with empty text", self.rubric)
            })?;
        }
        Ok(())
    }
}

/// A complete report. Used to check locally built and fallback reports alike.
pub struct ReportSchema {
    rubric: RubricKind,
}

impl ReportSchema {
    pub fn new(rubric: RubricKind) -> Self {
        Self { rubric }
    }
}

impl Schema for ReportSchema {
    type Artifact = ValidationReport;

    fn name(&self) -> &'static str {
        "report"
    }

    fn validate(&self, report: &ValidationReport) -> Result<(), SchemaViolation> {
        require(report.rubric == self.rubric, || {
            format!("expected {} report, got {}", self.rubric, report.rubric)
        })?;
        for principle in self.rubric.principles() {
            require(report.scores.contains_key(*principle), || {
                format!("missing score for '{}'", principle)
            })?;
        }
        require(report.scores.len() == self.rubric.principles().len(), || {
            "unexpected principle in scores".to_string()
        })?;
        require(
            report.scores.values().all(|s| (0.0..=1.0).contains(s)),
            || "score outside [0, 1]".to_string(),
        )?;
        let mean = crate::lesson::report::mean(report.scores.values().copied());
        require((report.overall - mean).abs() < 1e-9, || {
            format!("overall {} is not the mean {}", report.overall, mean)
        })?;
        require(
            report.overall >= COMPLIANCE_THRESHOLD || !report.recommendations.is_empty(),
            || "non-compliant report without recommendations".to_string(),
        )?;
        Ok(())
    }
}
