//! End-to-end runs against a healthy or briefly flaky service.

use super::test_utils::{
    content_json, coordinator, service_unavailable, sixty_minute_context, unit_title,
    valid_reply, ScriptedTransport, Step,
};
use lessonforge::gateway::PromptKind;
use lessonforge::lesson::{Grouping, RubricKind};
use lessonforge::pipeline::{StageKind, StageStatus};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn sixty_minute_lesson_completes_without_degradation() {
    let transport = Arc::new(ScriptedTransport::healthy());
    let context = sixty_minute_context();

    let output = coordinator(transport.clone())
        .generate(&context)
        .await
        .unwrap();

    assert!(!output.degraded);
    assert!(output.fallback_stages.is_empty());
    assert!(output.diagnostics.is_empty());
    assert!(output.run_id.starts_with("run-"));
    assert_eq!(output.context_fingerprint, context.fingerprint());
    assert_eq!(output.plan.overview.title, "The Cell Cycle");

    let allocation = &output.plan.allocation;
    assert_eq!(allocation.sum(), 60);
    assert!(Grouping::ALL.iter().all(|g| allocation.minutes(*g) >= 1));
    assert_eq!(output.plan.groupings.len(), Grouping::COUNT);
    for (entry, grouping) in output.plan.groupings.iter().zip(Grouping::ALL) {
        assert_eq!(entry.grouping, grouping);
        assert_eq!(entry.minutes, allocation.minutes(grouping));
    }

    // One plan call, one content call per grouping, one review per rubric.
    assert_eq!(transport.total_calls(), 1 + Grouping::COUNT + 3);

    let stages: Vec<StageKind> = output.stage_summaries.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![
            StageKind::Plan,
            StageKind::Content,
            StageKind::Representation,
            StageKind::Design,
            StageKind::Accessibility
        ]
    );
    assert!(output
        .stage_summaries
        .iter()
        .all(|s| s.status == StageStatus::Success));
    assert_eq!(output.grouping_summaries.len(), Grouping::COUNT);
    assert_eq!(output.units.len(), 2 * Grouping::COUNT);

    for rubric in RubricKind::MERGE_ORDER {
        let report = output.reports.get(rubric);
        assert_eq!(report.rubric, rubric);
        assert!(report.scores.values().all(|s| (0.0..=1.0).contains(s)));
        let mean = report.scores.values().sum::<f64>() / report.scores.len() as f64;
        assert!((report.overall - mean).abs() < 1e-9);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.text == format!("Service suggestion for {}", rubric)));
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_groupings_never_cross_assign_units() {
    // Later groupings answer first, so replies arrive in reverse of launch order.
    let transport = Arc::new(ScriptedTransport::new(|kind, _| match kind {
        PromptKind::Content { grouping } => Step::Delayed(
            Duration::from_secs(20 - u64::from(grouping.number())),
            content_json(grouping),
        ),
        _ => Step::Reply(valid_reply(kind)),
    }));
    let output = coordinator(transport.clone())
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    let finished: Vec<u8> = transport
        .completion_order()
        .into_iter()
        .filter_map(|kind| match kind {
            PromptKind::Content { grouping } => Some(grouping.number()),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![9, 8, 7, 6, 5, 4, 3, 2, 1]);

    assert!(!output.degraded);
    let mut previous = None;
    for unit in &output.units {
        let id = (unit.grouping, unit.sequence);
        assert!(previous < Some(id), "units out of order at {:?}", id);
        previous = Some(id);
        assert_eq!(unit.title, unit_title(unit.grouping, unit.sequence as usize));
    }
    for grouping in Grouping::ALL {
        assert_eq!(output.units_for(grouping).count(), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn enhancements_are_merged_into_units() {
    let transport = Arc::new(ScriptedTransport::healthy());
    let output = coordinator(transport)
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert!(output.enhancements_applied > 0);
    for unit in &output.units {
        // Accessibility is applied last and always adds its features to these units.
        assert!(unit
            .accessibility_features
            .iter()
            .any(|f| f.contains("Keyboard")));
        assert!(unit.style.text_color.is_some());
        assert!(unit.visuals.iter().all(|v| !v.alt_text.is_empty()));
    }
}

#[tokio::test(start_paused = true)]
async fn plan_recovers_after_two_transient_failures() {
    let transport = Arc::new(ScriptedTransport::new(|kind, earlier| match kind {
        PromptKind::Plan if earlier < 2 => service_unavailable(),
        _ => Step::Reply(valid_reply(kind)),
    }));

    let output = coordinator(transport.clone())
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert_eq!(transport.calls_for(PromptKind::Plan), 3);
    assert!(!output.degraded);
    assert_eq!(output.stage_summaries[0].status, StageStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn malformed_content_is_retried_then_accepted() {
    let grouping = Grouping::ElicitPerformance;
    let transport = Arc::new(ScriptedTransport::new(move |kind, earlier| match kind {
        PromptKind::Content { grouping: g } if g == grouping && earlier == 0 => {
            Step::Reply("```json\n{\"units\": []}\n```".to_string())
        }
        _ => Step::Reply(valid_reply(kind)),
    }));

    let output = coordinator(transport.clone())
        .generate(&sixty_minute_context())
        .await
        .unwrap();

    assert_eq!(transport.calls_for(PromptKind::Content { grouping }), 2);
    assert!(!output.degraded);
    assert_eq!(output.units_for(grouping).count(), 2);
}
