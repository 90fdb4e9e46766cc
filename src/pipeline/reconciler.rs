//! Result reconciliation: merges validator enhancements into the canonical unit list and
//! assembles the aggregate output.

use super::stage::{StageKind, StageResult, StageStatus};
use super::validators::ValidatorOutcome;
use crate::error::Degradation;
use crate::lesson::{ContentUnit, Grouping, PlanArtifact, RubricKind, ValidationReport};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: StageKind,
    pub status: StageStatus,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingSummary {
    pub grouping: Grouping,
    pub name: String,
    pub minutes: u32,
    pub unit_count: usize,
    pub status: StageStatus,
    pub teaching_strategies: Vec<String>,
    pub learning_outcomes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReports {
    pub representation: ValidationReport,
    pub design: ValidationReport,
    pub accessibility: ValidationReport,
}

impl ValidationReports {
    pub fn get(&self, rubric: RubricKind) -> &ValidationReport {
        match rubric {
            RubricKind::Representation => &self.representation,
            RubricKind::Design => &self.design,
            RubricKind::Accessibility => &self.accessibility,
        }
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutput {
    pub run_id: String,
    pub context_fingerprint: String,
    pub generated_at: String,
    pub plan: PlanArtifact,
    pub units: Vec<ContentUnit>,
    pub reports: ValidationReports,
    pub degraded: bool,
    pub fallback_stages: Vec<StageKind>,
    pub diagnostics: Vec<Degradation>,
    pub enhancements_applied: usize,
    pub stage_summaries: Vec<StageSummary>,
    pub grouping_summaries: Vec<GroupingSummary>,
}

impl AggregateOutput {
    pub fn units_for(&self, grouping: Grouping) -> impl Iterator<Item = &ContentUnit> {
        self.units.iter().filter(move |unit| unit.grouping == grouping)
    }
}

/// Outcome of re-validating existing units without generating anything new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRun {
    pub run_id: String,
    pub units: Vec<ContentUnit>,
    pub reports: ValidationReports,
    pub degraded: bool,
    pub fallback_stages: Vec<StageKind>,
    pub diagnostics: Vec<Degradation>,
    pub enhancements_applied: usize,
    pub stage_summaries: Vec<StageSummary>,
}

/// The three validator results, in merge order.
pub struct ValidatorResults {
    pub representation: StageResult<ValidatorOutcome>,
    pub design: StageResult<ValidatorOutcome>,
    pub accessibility: StageResult<ValidatorOutcome>,
}

impl ValidatorResults {
    fn in_merge_order(&self) -> [&StageResult<ValidatorOutcome>; 3] {
        [&self.representation, &self.design, &self.accessibility]
    }
}

/// Resolved stage results of one run, ready to merge.
pub struct RunParts {
    pub run_id: String,
    pub context_fingerprint: String,
    pub plan: StageResult<PlanArtifact>,
    pub content: StageResult<Vec<ContentUnit>>,
    pub validators: ValidatorResults,
    pub stage_summaries: Vec<StageSummary>,
    pub grouping_summaries: Vec<GroupingSummary>,
}

#[derive(Debug, Default)]
pub struct Reconciler;

impl Reconciler {
    /// Applies enhancements in representation, design, accessibility order. When two validators
    /// set the same unit field the later one wins outright.
    pub fn reconcile(&self, parts: RunParts) -> AggregateOutput {
        let RunParts {
            run_id,
            context_fingerprint,
            plan,
            content,
            validators,
            stage_summaries,
            grouping_summaries,
        } = parts;

        let [representation, design, accessibility] = validators.in_merge_order();
        let fallback_stages: Vec<StageKind> = [
            (plan.kind, plan.is_fallback()),
            (content.kind, content.is_fallback()),
            (representation.kind, representation.is_fallback()),
            (design.kind, design.is_fallback()),
            (accessibility.kind, accessibility.is_fallback()),
        ]
        .iter()
        .filter(|(_, fell_back)| *fell_back)
        .map(|(kind, _)| *kind)
        .collect();

        let mut units = content.payload;
        let enhancements_applied = self.apply_enhancements(&run_id, &mut units, &validators);

        let diagnostics: Vec<Degradation> = plan
            .diagnostics
            .into_iter()
            .chain(content.diagnostics)
            .chain(validator_diagnostics(&validators))
            .collect();

        AggregateOutput {
            run_id,
            context_fingerprint,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            plan: plan.payload,
            units,
            reports: reports(validators),
            degraded: !fallback_stages.is_empty(),
            fallback_stages,
            diagnostics,
            enhancements_applied,
            stage_summaries,
            grouping_summaries,
        }
    }

    /// Same merge as [`Reconciler::reconcile`] for a validators-only run.
    pub fn reconcile_validation(
        &self,
        run_id: String,
        mut units: Vec<ContentUnit>,
        validators: ValidatorResults,
        stage_summaries: Vec<StageSummary>,
    ) -> ValidationRun {
        let enhancements_applied = self.apply_enhancements(&run_id, &mut units, &validators);
        let fallback_stages: Vec<StageKind> = validators
            .in_merge_order()
            .iter()
            .filter(|result| result.is_fallback())
            .map(|result| result.kind)
            .collect();
        let diagnostics = validator_diagnostics(&validators);

        ValidationRun {
            run_id,
            units,
            reports: reports(validators),
            degraded: !fallback_stages.is_empty(),
            fallback_stages,
            diagnostics,
            enhancements_applied,
            stage_summaries,
        }
    }

    /// Sorts `units` into grouping order and applies every patch, last applied wins. Returns the
    /// number of patches applied.
    fn apply_enhancements(
        &self,
        run_id: &str,
        units: &mut [ContentUnit],
        validators: &ValidatorResults,
    ) -> usize {
        units.sort_by_key(|unit| (unit.grouping, unit.sequence));

        let mut applied = 0usize;
        for validator in validators.in_merge_order() {
            for patch in &validator.payload.patches {
                let Some(id) = patch.unit else { continue };
                if let Some(unit) = units.iter_mut().find(|unit| unit.id() == id) {
                    unit.apply(patch);
                    applied += 1;
                } else {
                    debug!(
                        run_id,
                        stage = %validator.kind,
                        grouping = id.grouping.number(),
                        sequence = id.sequence,
                        "Enhancement targets unknown unit"
                    );
                }
            }
        }
        applied
    }
}

fn validator_diagnostics(validators: &ValidatorResults) -> Vec<Degradation> {
    validators
        .in_merge_order()
        .iter()
        .flat_map(|result| result.diagnostics.iter().cloned())
        .collect()
}

fn reports(validators: ValidatorResults) -> ValidationReports {
    ValidationReports {
        representation: validators.representation.payload.report,
        design: validators.design.payload.report,
        accessibility: validators.accessibility.payload.report,
    }
}
