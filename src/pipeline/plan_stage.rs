//! Plan stage: local time allocation, then one generative call for the plan body.

use super::stage::{Stage, StageKind, StageScope};
use crate::error::StageError;
use crate::gateway::{PlanSchema, PromptSpec};
use crate::lesson::{ObjectiveTarget, PlanArtifact, TimeAllocation};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Default)]
pub struct PlanStage;

#[async_trait]
impl Stage for PlanStage {
    type Input = ();
    type Output = PlanArtifact;

    fn kind(&self) -> StageKind {
        StageKind::Plan
    }

    async fn run(&self, scope: &StageScope<'_>, _input: &()) -> Result<PlanArtifact, StageError> {
        let context = scope.context;
        let allocation = TimeAllocation::compute(context);
        let objectives = ObjectiveTarget::for_context(context);
        info!(
            run_id = scope.run_id,
            stage = %StageKind::Plan,
            total_minutes = allocation.total_minutes(),
            objective_count = objectives.count,
            remaining_ms = scope.remaining_ms(),
            "Time allocation computed"
        );

        let prompt = PromptSpec::plan(context, &allocation, &objectives);
        let schema = PlanSchema::new(context.cognitive_levels());
        let draft = scope
            .gateway
            .call(&prompt, &schema, scope.deadline, &scope.cancel)
            .await?;

        Ok(PlanArtifact::assemble(draft, allocation))
    }
}
