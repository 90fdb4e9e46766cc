//! Fallback Synthesizer
//!
//! Deterministic stand-ins for artifacts a stage could not obtain. Nothing here performs I/O or
//! can fail, and every artifact satisfies the same schema as its generated counterpart. There is
//! no plan fallback: a missing plan aborts the run.

use crate::lesson::report::{Priority, Recommendation};
use crate::lesson::{
    GenerationContext, GroupingPlan, Modality, RubricKind, UnitBatch, UnitDraft, UnitKind,
    ValidationReport, VisualElement, VisualKind,
};
use std::collections::BTreeMap;

/// Score every principle gets in a fallback report.
pub const NEUTRAL_SCORE: f64 = 0.5;

const BASELINE_ACCESSIBILITY: [&str; 3] = [
    "Screen reader compatible text",
    "High contrast text and background",
    "Keyboard navigable structure",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// `count` evenly sized units for one grouping, built from its planned activities.
    pub fn content_units(
        &self,
        context: &GenerationContext,
        entry: &GroupingPlan,
        count: u32,
    ) -> UnitBatch {
        let count = count.max(1);
        let duration = f64::from(entry.minutes.max(1)) / f64::from(count);

        let units = (0..count)
            .map(|index| {
                let activity = if entry.activities.is_empty() {
                    entry.description.clone()
                } else {
                    entry.activities[index as usize % entry.activities.len()].clone()
                };
                let title = if count == 1 {
                    entry.name.clone()
                } else {
                    format!("{} ({}/{})", entry.name, index + 1, count)
                };
                UnitDraft {
                    body: format!(
                        "## {}\n\n{}\n\n- Topic: {}\n- Activity: {}",
                        title,
                        entry.description,
                        context.topic(),
                        activity
                    ),
                    title,
                    kind: UnitKind::Mixed,
                    modalities: vec![Modality::Textual, Modality::Visual],
                    duration_minutes: duration,
                    visuals: vec![VisualElement {
                        kind: VisualKind::Diagram,
                        description: format!("Overview of {}", context.topic()),
                        alt_text: format!("Diagram summarizing {}", context.topic()),
                        caption: None,
                    }],
                    narration: Some(format!(
                        "In this part of the lesson on {} we {}.",
                        context.topic(),
                        entry.description.to_lowercase()
                    )),
                    speaker_notes: Some(format!("Guide learners through: {}", activity)),
                    key_points: vec![entry.description.clone()],
                    activities: vec![activity],
                    accessibility_features: BASELINE_ACCESSIBILITY
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                }
            })
            .collect();

        UnitBatch { units }
    }

    /// Neutral report: every principle scores 0.5 and recommendations come from the fixed
    /// catalog for the rubric.
    pub fn report(&self, rubric: RubricKind) -> ValidationReport {
        let scores: BTreeMap<String, f64> = rubric
            .principles()
            .iter()
            .map(|principle| (principle.to_string(), NEUTRAL_SCORE))
            .collect();
        ValidationReport::from_scores(rubric, scores, fallback_recommendations(rubric))
    }
}

/// General guidance used when a rubric could not be evaluated.
pub fn fallback_recommendations(rubric: RubricKind) -> Vec<Recommendation> {
    let catalog: &[(&str, &str)] = match rubric {
        RubricKind::Representation => &[
            ("representation", "Provide content in multiple formats (text, visuals, audio)"),
            ("action_expression", "Offer learners more than one way to demonstrate understanding"),
            ("engagement", "Connect content to learners' interests and real-world contexts"),
        ],
        RubricKind::Design => &[
            ("contrast", "Use high contrast colors for better readability"),
            ("repetition", "Maintain consistent fonts and colors throughout"),
            ("alignment", "Align elements consistently on each unit"),
            ("proximity", "Ensure adequate white space between sections"),
        ],
        RubricKind::Accessibility => &[
            ("perceivable", "Ensure all images have descriptive alt text"),
            ("operable", "Provide keyboard navigation for all interactive elements"),
            ("understandable", "Use clear, simple language appropriate for the audience"),
            ("robust", "Use semantic structure with a proper heading hierarchy"),
        ],
    };
    catalog
        .iter()
        .map(|(principle, text)| Recommendation::new(*principle, Priority::Medium, *text))
        .collect()
}
