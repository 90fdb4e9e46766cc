//! Validator stages: representation, design and accessibility scorecards.
//!
//! Scores come from local structural checks. Principles below threshold get catalog
//! recommendations and per-unit enhancement patches, then one review call adds the service's
//! own recommendations.

pub mod checks;
pub mod enhance;

use super::stage::{Stage, StageKind, StageScope};
use crate::error::StageError;
use crate::gateway::{PromptSpec, ReviewSchema};
use crate::lesson::{ContentUnit, RubricKind, UnitPatch, ValidationReport};
use async_trait::async_trait;
use tracing::{debug, info};

/// What a validator hands back: its report and the patches it wants applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorOutcome {
    pub report: ValidationReport,
    pub patches: Vec<UnitPatch>,
}

pub struct ValidatorStage {
    rubric: RubricKind,
}

impl ValidatorStage {
    pub fn new(rubric: RubricKind) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> RubricKind {
        self.rubric
    }

    /// The local part of validation: scores, catalog recommendations and patches.
    pub fn assess(&self, units: &[ContentUnit]) -> ValidatorOutcome {
        let scores = checks::score_rubric(self.rubric, units);
        let recommendations = enhance::recommendations(&scores);
        let report = ValidationReport::from_scores(self.rubric, scores, recommendations);
        let patches = enhance::enhancements(self.rubric, units);
        ValidatorOutcome { report, patches }
    }
}

#[async_trait]
impl Stage for ValidatorStage {
    type Input = Vec<ContentUnit>;
    type Output = ValidatorOutcome;

    fn kind(&self) -> StageKind {
        self.rubric.into()
    }

    async fn run(
        &self,
        scope: &StageScope<'_>,
        units: &Vec<ContentUnit>,
    ) -> Result<ValidatorOutcome, StageError> {
        let mut outcome = self.assess(units);
        debug!(
            run_id = scope.run_id,
            stage = %self.kind(),
            overall = outcome.report.overall,
            patches = outcome.patches.len(),
            "Local rubric assessment complete"
        );

        let prompt = PromptSpec::review(self.rubric, &outcome.report, units);
        let review = scope
            .gateway
            .call(
                &prompt,
                &ReviewSchema::new(self.rubric),
                scope.deadline,
                &scope.cancel,
            )
            .await?;
        outcome.report.merge_recommendations(review.recommendations);

        info!(
            run_id = scope.run_id,
            stage = %self.kind(),
            overall = outcome.report.overall,
            recommendations = outcome.report.recommendations.len(),
            "Validation report ready"
        );
        Ok(outcome)
    }
}
