//! Runs where stages fail, hang or get cancelled.

use super::test_utils::{
    bad_request, coordinator, service_unavailable, sixty_minute_context, valid_reply,
    ScriptedTransport, Step,
};
use lessonforge::error::{Degradation, PipelineError};
use lessonforge::fallback::{fallback_recommendations, NEUTRAL_SCORE};
use lessonforge::gateway::PromptKind;
use lessonforge::lesson::{Grouping, RubricKind};
use lessonforge::gateway::RetryPolicy;
use lessonforge::pipeline::{Coordinator, PipelineSettings, StageKind, StageStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn failing_grouping_falls_back_alone() {
    let failing = Grouping::PresentContent;
    let transport = Arc::new(ScriptedTransport::new(move |kind, _| match kind {
        PromptKind::Content { grouping } if grouping == failing => service_unavailable(),
        _ => Step::Reply(valid_reply(kind)),
    }));
    let context = sixty_minute_context();

    let output = coordinator(transport.clone())
        .generate(&context)
        .await
        .unwrap();

    assert!(output.degraded);
    assert_eq!(output.fallback_stages, vec![StageKind::Content]);
    assert_eq!(transport.calls_for(PromptKind::Content { grouping: failing }), 3);
    assert!(output.diagnostics.iter().any(|d| matches!(
        d,
        Degradation::GroupingDegraded { grouping, .. } if *grouping == failing
    )));
    assert_eq!(output.diagnostics.len(), 1);

    let minutes = f64::from(output.plan.allocation.minutes(failing));
    let units: Vec<_> = output.units_for(failing).collect();
    assert!(!units.is_empty());
    for unit in units {
        assert!(!unit.title.trim().is_empty());
        assert!(!unit.body.trim().is_empty());
        assert!(unit.duration_minutes > 0.0 && unit.duration_minutes <= minutes);
    }

    for summary in &output.grouping_summaries {
        let expected = if summary.grouping == failing {
            StageStatus::Fallback
        } else {
            StageStatus::Success
        };
        assert_eq!(summary.status, expected, "grouping {}", summary.grouping);
    }
    // Other groupings still carry generated units.
    assert_eq!(output.units_for(Grouping::GainAttention).count(), 2);
}

#[tokio::test(start_paused = true)]
async fn failing_validators_yield_neutral_reports() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Review { .. } => service_unavailable(),
        _ => Step::Reply(valid_reply(kind)),
    }));

    let output = coordinator(transport)
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert!(output.degraded);
    assert_eq!(
        output.fallback_stages,
        vec![
            StageKind::Representation,
            StageKind::Design,
            StageKind::Accessibility
        ]
    );
    for rubric in RubricKind::MERGE_ORDER {
        let report = output.reports.get(rubric);
        assert_eq!(report.overall, NEUTRAL_SCORE);
        assert!(report.scores.values().all(|s| *s == NEUTRAL_SCORE));
        assert_eq!(report.recommendations, fallback_recommendations(rubric));
    }
    // Fallback validators propose no enhancements.
    assert_eq!(output.enhancements_applied, 0);
    assert_eq!(output.units.len(), 2 * Grouping::COUNT);
}

#[tokio::test(start_paused = true)]
async fn plan_failure_aborts_the_run() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Plan => bad_request(),
        _ => Step::Reply(valid_reply(kind)),
    }));

    let result = coordinator(transport.clone())
        .generate(&sixty_minute_context())
        .await;

    assert!(matches!(result, Err(PipelineError::FatalPlanFailure { .. })));
    // Client errors are not retried and nothing downstream runs.
    assert_eq!(transport.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_plan_exhausts_retries_then_aborts() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Plan => Step::Reply("I'd be happy to help with your lesson!".to_string()),
        _ => Step::Reply(valid_reply(kind)),
    }));

    let result = coordinator(transport.clone())
        .generate(&sixty_minute_context())
        .await;

    let Err(PipelineError::FatalPlanFailure { reason }) = result else {
        panic!("expected plan failure");
    };
    assert!(reason.contains("plan"), "{reason}");
    assert_eq!(transport.calls_for(PromptKind::Plan), 3);
}

#[tokio::test(start_paused = true)]
async fn hanging_validator_is_bounded_by_its_deadline() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Review {
            rubric: RubricKind::Design,
        } => Step::Hang,
        _ => Step::Reply(valid_reply(kind)),
    }));

    let started = tokio::time::Instant::now();
    let output = coordinator(transport)
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert!(started.elapsed() <= Duration::from_secs(121));
    assert_eq!(output.fallback_stages, vec![StageKind::Design]);
    assert_eq!(output.reports.design.overall, NEUTRAL_SCORE);
    assert!(output
        .reports
        .representation
        .recommendations
        .iter()
        .any(|r| r.text.starts_with("Service suggestion")));
}

#[tokio::test(start_paused = true)]
async fn hanging_content_branches_fall_back_at_the_grouping_deadline() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Content { .. } => Step::Hang,
        _ => Step::Reply(valid_reply(kind)),
    }));

    let output = coordinator(transport)
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert!(output.degraded);
    assert!(output.fallback_stages.contains(&StageKind::Content));
    let degraded_groupings = output
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Degradation::GroupingDegraded { .. }))
        .count();
    assert_eq!(degraded_groupings, Grouping::COUNT);
    assert!(Grouping::ALL
        .iter()
        .all(|g| output.units_for(*g).count() >= 1));
}

#[tokio::test(start_paused = true)]
async fn content_deadline_keeps_finished_groupings() {
    let stuck = Grouping::from_number(7).unwrap();
    let transport = Arc::new(ScriptedTransport::new(move |kind, _| match kind {
        PromptKind::Content { grouping } if grouping == stuck => Step::Hang,
        _ => Step::Reply(valid_reply(kind)),
    }));
    let settings = PipelineSettings {
        content_timeout: Duration::from_secs(30),
        ..PipelineSettings::default()
    };
    assert!(settings.content_timeout < settings.grouping_timeout);
    let coordinator = Coordinator::new(transport.clone(), RetryPolicy::default(), settings);

    let started = tokio::time::Instant::now();
    let output = coordinator
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(32));
    assert_eq!(output.fallback_stages, vec![StageKind::Content]);
    assert_eq!(transport.calls_for(PromptKind::Content { grouping: stuck }), 1);
    for summary in &output.grouping_summaries {
        let expected = if summary.grouping == stuck {
            StageStatus::Fallback
        } else {
            StageStatus::Success
        };
        assert_eq!(summary.status, expected, "grouping {}", summary.grouping);
    }
    let degraded: Vec<_> = output
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Degradation::GroupingDegraded { grouping, .. } => Some(*grouping),
            _ => None,
        })
        .collect();
    assert_eq!(degraded, vec![stuck]);
    // Finished groupings keep their generated units.
    for grouping in Grouping::ALL.into_iter().filter(|g| *g != stuck) {
        assert!(output
            .units_for(grouping)
            .all(|u| u.title.starts_with(&format!("G{} unit", grouping.number()))));
    }
    assert!(output.units_for(stuck).count() >= 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_after_plan_still_returns_a_degraded_lesson() {
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Content { .. } => Step::Hang,
        _ => Step::Reply(valid_reply(kind)),
    }));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let output = coordinator(transport)
        .generate_with_cancel(&sixty_minute_context(), &cancel)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(output.degraded);
    assert!(output
        .grouping_summaries
        .iter()
        .all(|s| s.status == StageStatus::Fallback));
    for rubric in RubricKind::MERGE_ORDER {
        assert_eq!(output.reports.get(rubric).overall, NEUTRAL_SCORE);
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_before_plan_aborts() {
    let transport = Arc::new(ScriptedTransport::healthy());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = coordinator(transport)
        .generate_with_cancel(&sixty_minute_context(), &cancel)
        .await;

    assert!(matches!(result, Err(PipelineError::FatalPlanFailure { .. })));
}
