//! Refinement: rewrites the units of one grouping according to caller instructions.

use super::stage::{Stage, StageKind, StageScope, StageStatus};
use crate::error::{ContextError, Degradation, StageError};
use crate::gateway::{PromptSpec, UnitBatchSchema};
use crate::lesson::{ContentUnit, Grouping, GroupingPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

const MAX_INSTRUCTION_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementRequest {
    pub grouping: Grouping,
    pub instructions: String,
}

impl RefinementRequest {
    pub fn new(grouping: Grouping, instructions: impl Into<String>) -> Result<Self, ContextError> {
        let instructions = instructions.into().trim().to_string();
        if instructions.is_empty() {
            return Err(ContextError::Empty {
                field: "instructions",
            });
        }
        if instructions.chars().count() > MAX_INSTRUCTION_CHARS {
            return Err(ContextError::TooLong {
                field: "instructions",
                max: MAX_INSTRUCTION_CHARS,
            });
        }
        Ok(Self {
            grouping,
            instructions,
        })
    }
}

/// Result of one refinement. `units` is the full list in grouping order; on fallback the
/// grouping keeps its original units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementOutcome {
    pub run_id: String,
    pub grouping: Grouping,
    pub units: Vec<ContentUnit>,
    pub status: StageStatus,
    pub refined_units: usize,
    pub diagnostics: Vec<Degradation>,
    pub duration_ms: u64,
}

/// Input is the grouping's current units; output replaces them, re-tagged from sequence 0.
pub struct RefineStage<'a> {
    entry: &'a GroupingPlan,
    instructions: &'a str,
}

impl<'a> RefineStage<'a> {
    pub fn new(entry: &'a GroupingPlan, instructions: &'a str) -> Self {
        Self {
            entry,
            instructions,
        }
    }
}

#[async_trait]
impl<'a> Stage for RefineStage<'a> {
    type Input = Vec<ContentUnit>;
    type Output = Vec<ContentUnit>;

    fn kind(&self) -> StageKind {
        StageKind::Refinement
    }

    async fn run(
        &self,
        scope: &StageScope<'_>,
        current: &Vec<ContentUnit>,
    ) -> Result<Vec<ContentUnit>, StageError> {
        let grouping = self.entry.grouping;
        let prompt = PromptSpec::refine(scope.context, self.entry, current, self.instructions);
        let schema = UnitBatchSchema::new(grouping, self.entry.minutes);
        let batch = scope
            .gateway
            .call(&prompt, &schema, scope.deadline, &scope.cancel)
            .await?;

        info!(
            run_id = scope.run_id,
            stage = %StageKind::Refinement,
            grouping = grouping.number(),
            before = current.len(),
            after = batch.units.len(),
            remaining_ms = scope.remaining_ms(),
            "Grouping refined"
        );
        Ok(batch
            .units
            .into_iter()
            .enumerate()
            .map(|(sequence, draft)| ContentUnit::from_draft(grouping, sequence as u32, draft))
            .collect())
    }
}
