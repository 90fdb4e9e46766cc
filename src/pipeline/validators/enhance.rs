//! Principle-specific recommendations and templated unit enhancements.

use super::checks::unit_score;
use crate::lesson::report::{Priority, Recommendation, COMPLIANCE_THRESHOLD};
use crate::lesson::{
    ContentUnit, Modality, RubricKind, UnitPatch, UnitStyle, VisualElement, VisualKind,
};
use std::collections::BTreeMap;

/// Recommendations for every principle scoring below the compliance threshold.
pub fn recommendations(scores: &BTreeMap<String, f64>) -> Vec<Recommendation> {
    let mut out = Vec::new();
    for (principle, score) in scores {
        if *score >= COMPLIANCE_THRESHOLD {
            continue;
        }
        let priority = if *score < 0.5 {
            Priority::High
        } else {
            Priority::Medium
        };
        out.extend(
            catalog(principle)
                .iter()
                .map(|text| Recommendation::new(principle.as_str(), priority, *text)),
        );
    }
    out
}

fn catalog(principle: &str) -> &'static [&'static str] {
    match principle {
        "representation" => &[
            "Pair every key concept with a visual representation",
            "Provide narration or audio alternatives for text content",
            "Summarize each unit with explicit key points",
        ],
        "action_expression" => &[
            "Offer multiple ways for learners to respond (written, verbal, visual)",
            "Add hands-on or interactive practice activities",
        ],
        "engagement" => &[
            "Open units with a question or real-world scenario",
            "Include choices that let learners connect content to their interests",
        ],
        "contrast" => &[
            "Use bold headings and emphasis to separate key information",
            "Use high contrast color combinations (dark text on light backgrounds)",
        ],
        "repetition" => &[
            "Use consistent heading styles and sizes",
            "Maintain one font family and bullet style across all units",
        ],
        "alignment" => &[
            "Left-align body text and use a grid for element placement",
            "Keep line length under 120 characters",
        ],
        "proximity" => &[
            "Group related content and separate sections with white space",
            "Limit each unit to five key points",
        ],
        "perceivable" => &[
            "Add alt text to all images and visual elements",
            "Provide text alternatives for audio content",
        ],
        "operable" => &[
            "Ensure all interactive elements are keyboard accessible",
            "Keep timed segments under ten minutes and avoid flashing animation",
        ],
        "understandable" => &[
            "Use clear, simple language appropriate for the audience",
            "Keep sentences short and provide speaker notes for complex ideas",
        ],
        "robust" => &[
            "Use a sequential heading hierarchy without skipped levels",
            "Ensure compatibility with screen readers and assistive technologies",
        ],
        _ => &[],
    }
}

/// Per-unit patches for every unit scoring below threshold on a principle of `rubric`.
pub fn enhancements(rubric: RubricKind, units: &[ContentUnit]) -> Vec<UnitPatch> {
    units
        .iter()
        .filter_map(|unit| {
            let mut patch = UnitPatch::for_unit(unit.id());
            for principle in rubric.principles() {
                if unit_score(principle, unit) < COMPLIANCE_THRESHOLD {
                    enhance(principle, unit, &mut patch);
                }
            }
            (!patch.is_empty()).then_some(patch)
        })
        .collect()
}

/// Field value after earlier changes in the same patch, or the unit's current value.
fn current<T: Clone>(patched: &Option<T>, original: &T) -> T {
    patched.clone().unwrap_or_else(|| original.clone())
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn enhance(principle: &str, unit: &ContentUnit, patch: &mut UnitPatch) {
    match principle {
        "representation" => {
            let mut visuals = current(&patch.visuals, &unit.visuals);
            if visuals.is_empty() {
                visuals.push(VisualElement {
                    kind: VisualKind::Diagram,
                    description: format!("Concept diagram for {}", unit.title),
                    alt_text: format!("Diagram illustrating {}", unit.title),
                    caption: None,
                });
            }
            patch.visuals = Some(visuals);
            if unit.narration.is_none() {
                patch.narration = Some(format!(
                    "Narrated walkthrough of {}: {}",
                    unit.title,
                    unit.key_points.join("; ")
                ));
            }
            let mut modalities = current(&patch.modalities, &unit.modalities);
            for modality in [Modality::Textual, Modality::Visual, Modality::Auditory] {
                if !modalities.contains(&modality) {
                    modalities.push(modality);
                }
            }
            patch.modalities = Some(modalities);
        }
        "action_expression" => {
            let mut activities = current(&patch.activities, &unit.activities);
            push_unique(
                &mut activities,
                "Choose how to show your understanding: write, sketch or explain aloud",
            );
            patch.activities = Some(activities);
            let mut modalities = current(&patch.modalities, &unit.modalities);
            if !modalities.contains(&Modality::Interactive) {
                modalities.push(Modality::Interactive);
            }
            patch.modalities = Some(modalities);
        }
        "engagement" => {
            let mut activities = current(&patch.activities, &unit.activities);
            push_unique(
                &mut activities,
                "Relate this idea to an example from your own experience",
            );
            patch.activities = Some(activities);
        }
        "contrast" => {
            let style = patch.style.get_or_insert_with(UnitStyle::default);
            style.text_color = Some("#1a1a1a".to_string());
            style.background_color = Some("#ffffff".to_string());
            style.heading_color = Some("#003366".to_string());
        }
        "repetition" => {
            let style = patch.style.get_or_insert_with(UnitStyle::default);
            style.font_family = Some("Arial, sans-serif".to_string());
            style.bullet_style = Some("disc".to_string());
        }
        "alignment" => {
            let style = patch.style.get_or_insert_with(UnitStyle::default);
            style.text_align = Some("left".to_string());
        }
        "proximity" => {
            let style = patch.style.get_or_insert_with(UnitStyle::default);
            style.section_spacing = Some("1.5rem".to_string());
            style.line_height = Some("1.5".to_string());
        }
        "perceivable" => {
            let visuals = current(&patch.visuals, &unit.visuals)
                .into_iter()
                .map(|mut visual| {
                    if visual.alt_text.trim().is_empty() {
                        visual.alt_text = visual.description.clone();
                    }
                    visual
                })
                .collect();
            patch.visuals = Some(visuals);
            let mut features = current(&patch.accessibility_features, &unit.accessibility_features);
            push_unique(&mut features, "Text alternatives for all visual content");
            patch.accessibility_features = Some(features);
        }
        "operable" => {
            let mut features = current(&patch.accessibility_features, &unit.accessibility_features);
            push_unique(&mut features, "Keyboard navigation support");
            patch.accessibility_features = Some(features);
        }
        "understandable" => {
            if unit.speaker_notes.is_none() {
                patch.speaker_notes = Some(format!(
                    "Explain {} in plain language and check for understanding.",
                    unit.title
                ));
            }
        }
        "robust" => {
            let mut features = current(&patch.accessibility_features, &unit.accessibility_features);
            push_unique(&mut features, "Screen reader compatible structure");
            patch.accessibility_features = Some(features);
        }
        _ => {}
    }
}
