//! Follow-up operations on a finished lesson: refining one grouping and re-running validation.

use super::test_utils::{
    coordinator, refined_title, service_unavailable, sixty_minute_context, valid_reply,
    ScriptedTransport, Step,
};
use lessonforge::error::Degradation;
use lessonforge::fallback::{fallback_recommendations, NEUTRAL_SCORE};
use lessonforge::gateway::PromptKind;
use lessonforge::lesson::{Grouping, RubricKind};
use lessonforge::pipeline::{RefinementRequest, StageKind, StageStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn refinement_replaces_only_the_requested_grouping() {
    let transport = Arc::new(ScriptedTransport::healthy());
    let coordinator = coordinator(transport.clone());
    let context = sixty_minute_context();
    let lesson = coordinator.generate(&context).await.unwrap();

    let target = Grouping::PresentContent;
    let request = RefinementRequest::new(target, "Add a hands-on sorting activity").unwrap();
    let outcome = coordinator
        .refine(
            &context,
            &lesson.plan,
            lesson.units.clone(),
            &request,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.status, StageStatus::Success);
    assert_eq!(outcome.grouping, target);
    assert_eq!(outcome.refined_units, 3);
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(transport.calls_for(PromptKind::Refine { grouping: target }), 1);

    let refined: Vec<_> = outcome.units.iter().filter(|u| u.grouping == target).collect();
    assert_eq!(refined.len(), 3);
    for (index, unit) in refined.iter().enumerate() {
        assert_eq!(unit.sequence, index as u32);
        assert_eq!(unit.title, refined_title(target, index));
    }

    let untouched: Vec<_> = outcome.units.iter().filter(|u| u.grouping != target).collect();
    let original: Vec<_> = lesson.units.iter().filter(|u| u.grouping != target).collect();
    assert_eq!(untouched, original);
}

#[tokio::test(start_paused = true)]
async fn failed_refinement_keeps_original_units() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Refine { .. } => service_unavailable(),
        _ => Step::Reply(valid_reply(kind)),
    }));
    let coordinator = coordinator(transport.clone());
    let context = sixty_minute_context();
    let lesson = coordinator.generate(&context).await.unwrap();

    let target = Grouping::ProvideFeedback;
    let request = RefinementRequest::new(target, "Make the feedback more specific").unwrap();
    let outcome = coordinator
        .refine(
            &context,
            &lesson.plan,
            lesson.units.clone(),
            &request,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.status, StageStatus::Fallback);
    assert_eq!(outcome.refined_units, 0);
    assert_eq!(outcome.units, lesson.units);
    assert_eq!(transport.calls_for(PromptKind::Refine { grouping: target }), 3);
    assert!(matches!(
        outcome.diagnostics.as_slice(),
        [Degradation::GroupingDegraded { grouping, .. }] if *grouping == target
    ));
}

#[tokio::test(start_paused = true)]
async fn refining_a_grouping_without_units_makes_no_call() {
    let transport = Arc::new(ScriptedTransport::healthy());
    let coordinator = coordinator(transport.clone());
    let context = sixty_minute_context();
    let lesson = coordinator.generate(&context).await.unwrap();
    let before = transport.total_calls();

    let target = Grouping::GainAttention;
    let remaining: Vec<_> = lesson
        .units
        .iter()
        .filter(|u| u.grouping != target)
        .cloned()
        .collect();
    let request = RefinementRequest::new(target, "Open with a question").unwrap();
    let outcome = coordinator
        .refine(
            &context,
            &lesson.plan,
            remaining.clone(),
            &request,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.status, StageStatus::Fallback);
    assert_eq!(outcome.units, remaining);
    assert_eq!(transport.total_calls(), before);
}

#[tokio::test(start_paused = true)]
async fn validation_only_run_reviews_existing_units() {
    let transport = Arc::new(ScriptedTransport::healthy());
    let coordinator = coordinator(transport.clone());
    let context = sixty_minute_context();
    let lesson = coordinator.generate(&context).await.unwrap();

    let run = coordinator
        .validate(&context, lesson.units.clone(), &CancellationToken::new())
        .await;

    assert!(!run.degraded);
    assert!(run.run_id.starts_with("run-"));
    assert_ne!(run.run_id, lesson.run_id);
    assert_eq!(run.units.len(), lesson.units.len());
    let stages: Vec<StageKind> = run.stage_summaries.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![
            StageKind::Representation,
            StageKind::Design,
            StageKind::Accessibility
        ]
    );
    // Nothing is generated again; each rubric is reviewed a second time.
    assert_eq!(transport.calls_for(PromptKind::Plan), 1);
    assert_eq!(
        transport.calls_for(PromptKind::Content {
            grouping: Grouping::PresentContent
        }),
        1
    );
    for rubric in RubricKind::MERGE_ORDER {
        assert_eq!(transport.calls_for(PromptKind::Review { rubric }), 2);
        let report = run.reports.get(rubric);
        let mean = report.scores.values().sum::<f64>() / report.scores.len() as f64;
        assert!((report.overall - mean).abs() < 1e-9);
    }
}

#[tokio::test(start_paused = true)]
async fn validation_only_run_falls_back_to_neutral_reports() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Review { .. } => service_unavailable(),
        _ => Step::Reply(valid_reply(kind)),
    }));
    let coordinator = coordinator(transport);
    let context = sixty_minute_context();
    let lesson = coordinator.generate(&context).await.unwrap();

    let run = coordinator
        .validate(&context, lesson.units.clone(), &CancellationToken::new())
        .await;

    assert!(run.degraded);
    assert_eq!(run.fallback_stages.len(), 3);
    assert_eq!(run.diagnostics.len(), 3);
    assert_eq!(run.enhancements_applied, 0);
    assert_eq!(run.units, lesson.units);
    for rubric in RubricKind::MERGE_ORDER {
        let report = run.reports.get(rubric);
        assert_eq!(report.overall, NEUTRAL_SCORE);
        assert_eq!(report.recommendations, fallback_recommendations(rubric));
    }
}
