//! Content stage: one concurrent branch per grouping, each with its own deadline.
//!
//! The stage never substitutes content itself. It reports one [`GroupingOutcome`] per grouping,
//! in teaching order, and leaves fallback decisions to the coordinator. Branches still running
//! when the stage deadline passes are dropped, which aborts their in-flight calls.

use super::stage::{Stage, StageKind, StageScope};
use crate::error::{GatewayError, StageError};
use crate::gateway::{PromptSpec, UnitBatchSchema};
use crate::lesson::content::unit_count;
use crate::lesson::{
    AudienceLevel, CognitiveLevel, Grouping, GroupingPlan, Objective, PlanArtifact, UnitBatch,
};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// What one branch asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingRequest {
    pub entry: GroupingPlan,
    pub unit_count: u32,
    pub teaching_strategies: Vec<String>,
    pub learning_outcomes: Vec<String>,
}

impl GroupingRequest {
    pub fn new(entry: &GroupingPlan, objectives: &[Objective], audience: AudienceLevel) -> Self {
        Self {
            unit_count: unit_count(
                entry.grouping,
                entry.minutes,
                entry.activities.len(),
                audience,
            ),
            teaching_strategies: teaching_strategies(&entry.activities),
            learning_outcomes: learning_outcomes(entry.grouping, objectives),
            entry: entry.clone(),
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.entry.grouping
    }
}

/// Result of one branch.
#[derive(Debug)]
pub struct GroupingOutcome {
    pub request: GroupingRequest,
    pub result: Result<UnitBatch, StageError>,
    pub duration_ms: u128,
}

pub struct ContentStage {
    grouping_timeout: Duration,
}

impl ContentStage {
    pub fn new(grouping_timeout: Duration) -> Self {
        Self { grouping_timeout }
    }
}

#[async_trait]
impl Stage for ContentStage {
    type Input = PlanArtifact;
    type Output = Vec<GroupingOutcome>;

    fn kind(&self) -> StageKind {
        StageKind::Content
    }

    async fn run(
        &self,
        scope: &StageScope<'_>,
        plan: &PlanArtifact,
    ) -> Result<Vec<GroupingOutcome>, StageError> {
        let started = Instant::now();
        let requests: Vec<GroupingRequest> = plan
            .groupings
            .iter()
            .map(|entry| GroupingRequest::new(entry, &plan.objectives, scope.context.audience()))
            .collect();

        let mut slots: Vec<Option<(Result<UnitBatch, GatewayError>, u128)>> =
            requests.iter().map(|_| None).collect();

        let mut pending = FuturesUnordered::new();
        for (index, request) in requests.iter().enumerate() {
            let branch_deadline = (Instant::now() + self.grouping_timeout).min(scope.deadline);
            debug!(
                run_id = scope.run_id,
                grouping = request.grouping().number(),
                unit_count = request.unit_count,
                "Grouping branch started"
            );
            pending.push(async move {
                let branch_started = Instant::now();
                let prompt = PromptSpec::content(
                    scope.context,
                    plan,
                    &request.entry,
                    request.unit_count,
                    &request.teaching_strategies,
                    &request.learning_outcomes,
                );
                let schema = UnitBatchSchema::new(request.grouping(), request.entry.minutes);
                let result = scope
                    .gateway
                    .call(&prompt, &schema, branch_deadline, &scope.cancel)
                    .await;
                (index, result, branch_started.elapsed().as_millis())
            });
        }

        let stage_deadline = sleep_until(scope.deadline);
        tokio::pin!(stage_deadline);
        loop {
            tokio::select! {
                biased;
                _ = scope.cancel.cancelled() => break,
                _ = &mut stage_deadline => {
                    warn!(
                        run_id = scope.run_id,
                        stage = %StageKind::Content,
                        unfinished = pending.len(),
                        "Content stage deadline elapsed"
                    );
                    break;
                }
                next = pending.next() => match next {
                    Some((index, result, duration_ms)) => {
                        if let Err(err) = &result {
                            warn!(
                                run_id = scope.run_id,
                                grouping = requests[index].grouping().number(),
                                duration_ms,
                                error = %err,
                                "Grouping branch failed"
                            );
                        }
                        slots[index] = Some((result, duration_ms));
                    }
                    None => break,
                },
            }
        }
        // Unfinished branches are dropped here.
        drop(pending);

        let unfinished = if scope.cancel.is_cancelled() {
            StageError::Cancelled(StageKind::Content)
        } else {
            StageError::DeadlineElapsed(StageKind::Content)
        };
        let elapsed_ms = started.elapsed().as_millis();
        let outcomes: Vec<GroupingOutcome> = requests
            .into_iter()
            .zip(slots)
            .map(|(request, slot)| match slot {
                Some((result, duration_ms)) => GroupingOutcome {
                    request,
                    result: result.map_err(StageError::from),
                    duration_ms,
                },
                None => GroupingOutcome {
                    request,
                    result: Err(unfinished.clone()),
                    duration_ms: elapsed_ms,
                },
            })
            .collect();

        info!(
            run_id = scope.run_id,
            stage = %StageKind::Content,
            succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count(),
            failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
            duration_ms = elapsed_ms,
            "Content branches collected"
        );
        Ok(outcomes)
    }
}

/// Teaching strategies implied by the planned activities.
pub fn teaching_strategies(activities: &[String]) -> Vec<String> {
    const KEYWORDS: [(&str, &str); 5] = [
        ("discussion", "Interactive discussion"),
        ("demonstration", "Demonstration"),
        ("practice", "Guided practice"),
        ("group", "Collaborative learning"),
        ("visual", "Visual learning"),
    ];
    let mut strategies: Vec<String> = Vec::new();
    for activity in activities {
        let lower = activity.to_lowercase();
        if let Some((_, strategy)) = KEYWORDS.iter().find(|(keyword, _)| lower.contains(keyword)) {
            if !strategies.iter().any(|s| s == strategy) {
                strategies.push(strategy.to_string());
            }
        }
    }
    if strategies.is_empty() {
        strategies.push("Direct instruction".to_string());
    }
    strategies
}

/// Up to three objectives whose level matches the grouping's phase.
pub fn learning_outcomes(grouping: Grouping, objectives: &[Objective]) -> Vec<String> {
    let phase: &[CognitiveLevel] = match grouping.number() {
        1..=4 => &[CognitiveLevel::Remember, CognitiveLevel::Understand],
        5..=6 => &[CognitiveLevel::Apply, CognitiveLevel::Analyze],
        _ => &[CognitiveLevel::Evaluate, CognitiveLevel::Create],
    };
    let outcomes: Vec<String> = objectives
        .iter()
        .filter(|objective| phase.contains(&objective.level))
        .take(3)
        .map(|objective| objective.statement.clone())
        .collect();
    if outcomes.is_empty() {
        vec!["Students will demonstrate understanding".to_string()]
    } else {
        outcomes
    }
}
