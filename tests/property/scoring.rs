//! Property-based tests for validation reports

use lessonforge::fallback::fallback_recommendations;
use lessonforge::gateway::{ReportSchema, Schema};
use lessonforge::lesson::{RubricKind, ValidationReport};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn rubric() -> impl Strategy<Value = RubricKind> {
    proptest::sample::select(RubricKind::MERGE_ORDER.to_vec())
}

proptest! {
    /// Scores are clamped into [0, 1] and overall is their mean.
    #[test]
    fn report_overall_is_mean_of_clamped_scores(
        rubric in rubric(),
        raw in proptest::collection::vec(-1.0f64..2.0, 4),
    ) {
        let scores: BTreeMap<String, f64> = rubric
            .principles()
            .iter()
            .zip(raw)
            .map(|(principle, score)| (principle.to_string(), score))
            .collect();
        let report = ValidationReport::from_scores(rubric, scores, fallback_recommendations(rubric));

        prop_assert!(report.scores.values().all(|s| (0.0..=1.0).contains(s)));
        let mean = report.scores.values().sum::<f64>() / report.scores.len() as f64;
        prop_assert!((report.overall - mean).abs() < 1e-9);
        prop_assert!(ReportSchema::new(rubric).validate(&report).is_ok());
    }
}
