//! Pipeline coordinator: sequences stages, enforces deadlines and decides between success,
//! fallback and abort.

use super::content_stage::{ContentStage, GroupingOutcome, GroupingRequest};
use super::plan_stage::PlanStage;
use super::reconciler::{
    AggregateOutput, GroupingSummary, Reconciler, RunParts, StageSummary, ValidationRun,
    ValidatorResults,
};
use super::refine_stage::{RefineStage, RefinementOutcome, RefinementRequest};
use super::stage::{Stage, StageKind, StageResult, StageScope, StageStatus};
use super::validators::{ValidatorOutcome, ValidatorStage};
use crate::error::{Degradation, PipelineError, StageError};
use crate::fallback::FallbackSynthesizer;
use crate::gateway::{Gateway, GenerativeTransport, RetryPolicy};
use crate::lesson::{ContentUnit, GenerationContext, PlanArtifact, RubricKind};
use crate::telemetry::new_run_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Deadlines per stage kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub plan_timeout: Duration,
    pub content_timeout: Duration,
    /// Per-grouping branch, further bounded by the content deadline.
    pub grouping_timeout: Duration,
    pub validator_timeout: Duration,
    /// Slack past a stage deadline before the coordinator drops the stage outright.
    pub guard_grace: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            plan_timeout: Duration::from_secs(180),
            content_timeout: Duration::from_secs(300),
            grouping_timeout: Duration::from_secs(240),
            validator_timeout: Duration::from_secs(120),
            guard_grace: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    PlanPending,
    ContentPending,
    ValidatorsPending,
    Reconciling,
    Done,
    Aborted,
}

impl PipelineState {
    /// Strictly forward; only the plan stage can abort.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (PlanPending, ContentPending)
                | (PlanPending, Aborted)
                | (ContentPending, ValidatorsPending)
                | (ValidatorsPending, Reconciling)
                | (Reconciling, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::PlanPending => "plan_pending",
            PipelineState::ContentPending => "content_pending",
            PipelineState::ValidatorsPending => "validators_pending",
            PipelineState::Reconciling => "reconciling",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

pub struct Coordinator {
    gateway: Gateway,
    settings: PipelineSettings,
    synthesizer: FallbackSynthesizer,
    reconciler: Reconciler,
}

impl Coordinator {
    pub fn new(
        transport: Arc<dyn GenerativeTransport>,
        policy: RetryPolicy,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            gateway: Gateway::new(transport, policy),
            settings,
            synthesizer: FallbackSynthesizer::new(),
            reconciler: Reconciler,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs the whole pipeline. Only a failed plan is an error; every later failure is absorbed
    /// into a degraded output.
    pub async fn generate(
        &self,
        context: &GenerationContext,
    ) -> Result<AggregateOutput, PipelineError> {
        self.generate_with_cancel(context, &CancellationToken::new())
            .await
    }

    /// Like [`Coordinator::generate`], stopping every in-flight call once `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        context: &GenerationContext,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutput, PipelineError> {
        let run_id = new_run_id();
        let run_cancel = cancel.child_token();
        let mut state = PipelineState::PlanPending;
        let mut stage_summaries = Vec::with_capacity(5);
        info!(
            run_id = %run_id,
            transport = self.gateway.transport_name(),
            max_attempts = self.gateway.policy().max_attempts,
            topic = context.topic(),
            total_minutes = context.total_minutes(),
            "Pipeline run started"
        );

        // Plan: fatal on failure.
        let started = Instant::now();
        let plan = match self
            .run_stage(&PlanStage, &(), context, &run_id, &run_cancel, self.settings.plan_timeout)
            .await
        {
            Ok(plan) => plan,
            Err(err) => {
                self.advance(&mut state, PipelineState::Aborted, &run_id);
                error!(
                    run_id = %run_id,
                    stage = %StageKind::Plan,
                    duration_ms = started.elapsed().as_millis(),
                    error = %err,
                    "Plan stage failed, aborting run"
                );
                return Err(PipelineError::FatalPlanFailure {
                    reason: err.to_string(),
                });
            }
        };
        stage_summaries.push(summary(StageKind::Plan, StageStatus::Success, started));
        let plan = StageResult::success(StageKind::Plan, plan);
        self.advance(&mut state, PipelineState::ContentPending, &run_id);

        // Content: per-grouping fallback.
        let started = Instant::now();
        let content_stage = ContentStage::new(self.settings.grouping_timeout);
        let (content, grouping_summaries) = match self
            .run_stage(
                &content_stage,
                &plan.payload,
                context,
                &run_id,
                &run_cancel,
                self.settings.content_timeout,
            )
            .await
        {
            Ok(outcomes) => self.resolve_content(context, outcomes, &run_id),
            Err(err) => self.synthesize_content(context, &plan.payload, err, &run_id),
        };
        stage_summaries.push(summary(StageKind::Content, content.status, started));
        self.advance(&mut state, PipelineState::ValidatorsPending, &run_id);

        let (validators, validator_summaries) = self
            .run_validators(&content.payload, context, &run_id, &run_cancel)
            .await;
        stage_summaries.extend(validator_summaries);
        self.advance(&mut state, PipelineState::Reconciling, &run_id);

        let output = self.reconciler.reconcile(RunParts {
            run_id: run_id.clone(),
            context_fingerprint: context.fingerprint(),
            plan,
            content,
            validators,
            stage_summaries,
            grouping_summaries,
        });
        self.advance(&mut state, PipelineState::Done, &run_id);

        info!(
            run_id = %run_id,
            degraded = output.degraded,
            fallback_stages = ?output.fallback_stages,
            units = output.units.len(),
            enhancements = output.enhancements_applied,
            "Pipeline run complete"
        );
        Ok(output)
    }

    /// Re-validates existing units: the three validators and the enhancement merge, with the
    /// same deadlines and neutral fallbacks as a full run. Never fails.
    pub async fn validate(
        &self,
        context: &GenerationContext,
        units: Vec<ContentUnit>,
        cancel: &CancellationToken,
    ) -> ValidationRun {
        let run_id = new_run_id();
        let run_cancel = cancel.child_token();
        info!(
            run_id = %run_id,
            transport = self.gateway.transport_name(),
            units = units.len(),
            "Validation run started"
        );

        let (validators, stage_summaries) = self
            .run_validators(&units, context, &run_id, &run_cancel)
            .await;
        let run = self
            .reconciler
            .reconcile_validation(run_id, units, validators, stage_summaries.to_vec());

        info!(
            run_id = %run.run_id,
            degraded = run.degraded,
            fallback_stages = ?run.fallback_stages,
            enhancements = run.enhancements_applied,
            "Validation run complete"
        );
        run
    }

    /// Rewrites the units of `request.grouping` following the caller's instructions.
    ///
    /// The other groupings pass through untouched. If the rewrite cannot be obtained before the
    /// grouping deadline the original units are kept and the outcome is marked as a fallback.
    pub async fn refine(
        &self,
        context: &GenerationContext,
        plan: &PlanArtifact,
        units: Vec<ContentUnit>,
        request: &RefinementRequest,
        cancel: &CancellationToken,
    ) -> RefinementOutcome {
        let run_id = new_run_id();
        let grouping = request.grouping;
        let started = Instant::now();
        let (current, mut others): (Vec<ContentUnit>, Vec<ContentUnit>) =
            units.into_iter().partition(|unit| unit.grouping == grouping);
        info!(
            run_id = %run_id,
            grouping = grouping.number(),
            units = current.len(),
            "Refinement started"
        );

        let entry = plan.groupings.iter().find(|entry| entry.grouping == grouping);
        let result = match entry {
            Some(entry) if !current.is_empty() => {
                let stage = RefineStage::new(entry, &request.instructions);
                self.run_stage(
                    &stage,
                    &current,
                    context,
                    &run_id,
                    &cancel.child_token(),
                    self.settings.grouping_timeout,
                )
                .await
                .map_err(|err| (fallback_status(&err), err.to_string()))
            }
            Some(_) => Err((StageStatus::Fallback, "no units to refine".to_string())),
            None => Err((StageStatus::Fallback, "grouping missing from plan".to_string())),
        };

        let (refined, status, diagnostics) = match result {
            Ok(refined) => (refined, StageStatus::Success, Vec::new()),
            Err((status, reason)) => {
                warn!(
                    run_id = %run_id,
                    grouping = grouping.number(),
                    reason = %reason,
                    "Refinement fell back to the original units"
                );
                (
                    current,
                    status,
                    vec![Degradation::GroupingDegraded { grouping, reason }],
                )
            }
        };

        let refined_units = if status == StageStatus::Success {
            refined.len()
        } else {
            0
        };
        others.extend(refined);
        others.sort_by_key(|unit| (unit.grouping, unit.sequence));

        RefinementOutcome {
            run_id,
            grouping,
            units: others,
            status,
            refined_units,
            diagnostics,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Runs the three validators concurrently, each falling back to its neutral report.
    async fn run_validators(
        &self,
        units: &Vec<ContentUnit>,
        context: &GenerationContext,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> (ValidatorResults, [StageSummary; 3]) {
        let representation = ValidatorStage::new(RubricKind::Representation);
        let design = ValidatorStage::new(RubricKind::Design);
        let accessibility = ValidatorStage::new(RubricKind::Accessibility);
        let (
            (representation, representation_summary),
            (design, design_summary),
            (accessibility, accessibility_summary),
        ) = tokio::join!(
            self.run_validator(&representation, units, context, run_id, cancel),
            self.run_validator(&design, units, context, run_id, cancel),
            self.run_validator(&accessibility, units, context, run_id, cancel),
        );
        (
            ValidatorResults {
                representation,
                design,
                accessibility,
            },
            [representation_summary, design_summary, accessibility_summary],
        )
    }

    /// Runs one stage under its deadline, plus an outer guard for stages that overrun it.
    async fn run_stage<S: Stage>(
        &self,
        stage: &S,
        input: &S::Input,
        context: &GenerationContext,
        run_id: &str,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<S::Output, StageError> {
        let deadline = Instant::now() + timeout;
        let scope = StageScope {
            run_id,
            gateway: &self.gateway,
            context,
            deadline,
            cancel: cancel.child_token(),
        };
        info!(
            run_id,
            stage = %stage.kind(),
            timeout_ms = timeout.as_millis(),
            "Stage started"
        );

        match timeout_at(deadline + self.settings.guard_grace, stage.run(&scope, input)).await {
            Ok(result) => result,
            Err(_) => {
                scope.cancel.cancel();
                warn!(
                    run_id,
                    stage = %stage.kind(),
                    "Stage overran its deadline and was dropped"
                );
                Err(if cancel.is_cancelled() {
                    StageError::Cancelled(stage.kind())
                } else {
                    StageError::DeadlineElapsed(stage.kind())
                })
            }
        }
    }

    async fn run_validator(
        &self,
        stage: &ValidatorStage,
        units: &Vec<ContentUnit>,
        context: &GenerationContext,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> (StageResult<ValidatorOutcome>, StageSummary) {
        let started = Instant::now();
        let kind = stage.kind();
        let result = match self
            .run_stage(
                stage,
                units,
                context,
                run_id,
                cancel,
                self.settings.validator_timeout,
            )
            .await
        {
            Ok(outcome) => StageResult::success(kind, outcome),
            Err(err) => {
                let status = fallback_status(&err);
                warn!(
                    run_id,
                    stage = %kind,
                    error = %err,
                    "Validator fell back to neutral report"
                );
                StageResult::degraded(
                    kind,
                    status,
                    ValidatorOutcome {
                        report: self.synthesizer.report(stage.rubric()),
                        patches: Vec::new(),
                    },
                    vec![Degradation::StageDegraded {
                        stage: kind,
                        reason: err.to_string(),
                    }],
                )
            }
        };
        let stage_summary = summary(kind, result.status, started);
        (result, stage_summary)
    }

    /// Tags generated units with their branch identity and substitutes fallback units for
    /// groupings that failed.
    fn resolve_content(
        &self,
        context: &GenerationContext,
        outcomes: Vec<GroupingOutcome>,
        run_id: &str,
    ) -> (StageResult<Vec<ContentUnit>>, Vec<GroupingSummary>) {
        let mut units = Vec::new();
        let mut diagnostics = Vec::new();
        let mut summaries = Vec::with_capacity(outcomes.len());

        for GroupingOutcome {
            request, result, ..
        } in outcomes
        {
            let grouping = request.grouping();
            let (batch, status) = match result {
                Ok(batch) => (batch, StageStatus::Success),
                Err(err) => {
                    warn!(
                        run_id,
                        grouping = grouping.number(),
                        error = %err,
                        "Grouping fell back to synthesized units"
                    );
                    diagnostics.push(Degradation::GroupingDegraded {
                        grouping,
                        reason: err.to_string(),
                    });
                    let batch = self.synthesizer.content_units(
                        context,
                        &request.entry,
                        request.unit_count,
                    );
                    (batch, StageStatus::Fallback)
                }
            };

            let before = units.len();
            units.extend(
                batch
                    .units
                    .into_iter()
                    .enumerate()
                    .map(|(sequence, draft)| {
                        ContentUnit::from_draft(grouping, sequence as u32, draft)
                    }),
            );
            summaries.push(GroupingSummary {
                grouping,
                name: request.entry.name.clone(),
                minutes: request.entry.minutes,
                unit_count: units.len() - before,
                status,
                teaching_strategies: request.teaching_strategies,
                learning_outcomes: request.learning_outcomes,
            });
        }

        let result = if diagnostics.is_empty() {
            StageResult::success(StageKind::Content, units)
        } else {
            StageResult::degraded(StageKind::Content, StageStatus::Fallback, units, diagnostics)
        };
        (result, summaries)
    }

    /// Whole-stage failure: every grouping gets synthesized units.
    fn synthesize_content(
        &self,
        context: &GenerationContext,
        plan: &PlanArtifact,
        err: StageError,
        run_id: &str,
    ) -> (StageResult<Vec<ContentUnit>>, Vec<GroupingSummary>) {
        let outcomes = plan
            .groupings
            .iter()
            .map(|entry| GroupingOutcome {
                request: GroupingRequest::new(entry, &plan.objectives, context.audience()),
                result: Err(err.clone()),
                duration_ms: 0,
            })
            .collect();
        let (mut result, summaries) = self.resolve_content(context, outcomes, run_id);
        result.status = StageStatus::Failed;
        result.diagnostics.insert(
            0,
            Degradation::StageDegraded {
                stage: StageKind::Content,
                reason: err.to_string(),
            },
        );
        (result, summaries)
    }

    fn advance(&self, state: &mut PipelineState, next: PipelineState, run_id: &str) {
        if state.can_advance_to(next) {
            info!(run_id, from = %state, to = %next, "Pipeline state advanced");
            *state = next;
        } else {
            warn!(run_id, from = %state, to = %next, "Ignoring invalid pipeline transition");
        }
    }
}

/// A gateway that gave up yields a fallback; a stage cut off by its deadline or a cancel failed.
fn fallback_status(err: &StageError) -> StageStatus {
    match err {
        StageError::Gateway(_) => StageStatus::Fallback,
        StageError::DeadlineElapsed(_) | StageError::Cancelled(_) => StageStatus::Failed,
    }
}

fn summary(stage: StageKind, status: StageStatus, started: Instant) -> StageSummary {
    StageSummary {
        stage,
        status,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}
