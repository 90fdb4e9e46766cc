//! Structural rubric checks. Each principle is four weighted checks per unit; nothing here tries
//! to understand the content.

use crate::lesson::{ContentUnit, Modality, RubricKind, UnitKind, VisualKind};
use std::collections::BTreeMap;

/// Weighted checks of one unit against a principle. Weights sum to 1.0.
fn checks(principle: &str, u: &ContentUnit) -> [(f64, bool); 4] {
    match principle {
        // Representation rubric
        "representation" => [
            (0.30, !u.visuals.is_empty()),
            (0.25, u.narration.is_some()),
            (0.25, distinct_modalities(u) >= 2),
            (0.20, !u.key_points.is_empty()),
        ],
        "action_expression" => [
            (0.35, !u.activities.is_empty()),
            (
                0.25,
                u.modalities
                    .iter()
                    .any(|m| matches!(m, Modality::Interactive | Modality::Kinesthetic)),
            ),
            (
                0.20,
                matches!(u.kind, UnitKind::ActivityGuide | UnitKind::Assessment)
                    || u.activities.len() >= 2,
            ),
            (0.20, u.speaker_notes.is_some()),
        ],
        "engagement" => [
            (0.25, u.body.contains('?')),
            (0.25, !u.activities.is_empty()),
            (0.25, !u.visuals.is_empty()),
            (0.25, u.narration.is_some()),
        ],

        // Design rubric
        "contrast" => [
            (0.30, has_heading(u)),
            (
                0.20,
                u.style.text_color.is_some() || u.style.background_color.is_some(),
            ),
            (0.25, !u.key_points.is_empty()),
            (0.25, u.body.contains("**")),
        ],
        "repetition" => [
            (0.25, !u.title.trim().is_empty()),
            (0.25, u.body.trim_start().starts_with('#')),
            (0.25, u.style.font_family.is_some()),
            (0.25, has_bullets(u)),
        ],
        "alignment" => [
            (0.30, u.style.text_align.is_some()),
            (0.30, u.body.lines().count() <= 25),
            (0.20, u.body.lines().all(|line| line.chars().count() <= 120)),
            (0.20, has_bullets(u)),
        ],
        "proximity" => [
            (0.30, u.body.contains("\n\n")),
            (0.30, u.style.section_spacing.is_some()),
            (0.20, u.key_points.len() <= 5),
            (0.20, word_count(&u.body) <= 300),
        ],

        // Accessibility rubric
        "perceivable" => [
            (0.40, u.visuals.iter().all(|v| !v.alt_text.trim().is_empty())),
            (0.20, u.narration.is_some()),
            (0.20, has_heading(u)),
            (0.20, !u.accessibility_features.is_empty()),
        ],
        "operable" => [
            (0.40, mentions_feature(u, "keyboard")),
            (0.20, u.duration_minutes <= 10.0),
            (0.20, !u.activities.is_empty()),
            (0.20, u.visuals.iter().all(|v| v.kind != VisualKind::Animation)),
        ],
        "understandable" => [
            (0.30, word_count(&u.body) <= 300),
            (0.30, mean_sentence_words(&u.body) <= 25.0),
            (0.20, !u.key_points.is_empty()),
            (0.20, u.speaker_notes.is_some()),
        ],
        "robust" => [
            (0.30, heading_hierarchy_is_sequential(u)),
            (0.30, mentions_feature(u, "screen reader")),
            (0.20, u.visuals.iter().all(|v| !v.description.trim().is_empty())),
            (0.20, !u.modalities.is_empty()),
        ],
        _ => [(0.0, false); 4],
    }
}

/// Weighted score of one unit against one principle.
pub fn unit_score(principle: &str, unit: &ContentUnit) -> f64 {
    checks(principle, unit)
        .iter()
        .filter(|(_, passed)| *passed)
        .map(|(weight, _)| weight)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Principle score: mean over units of the weighted check sum.
pub fn principle_score(principle: &str, units: &[ContentUnit]) -> f64 {
    if units.is_empty() {
        return 0.0;
    }
    let total: f64 = units.iter().map(|unit| unit_score(principle, unit)).sum();
    (total / units.len() as f64).clamp(0.0, 1.0)
}

pub fn score_rubric(rubric: RubricKind, units: &[ContentUnit]) -> BTreeMap<String, f64> {
    rubric
        .principles()
        .iter()
        .map(|principle| (principle.to_string(), principle_score(principle, units)))
        .collect()
}

fn distinct_modalities(unit: &ContentUnit) -> usize {
    let mut modalities = unit.modalities.clone();
    modalities.sort();
    modalities.dedup();
    modalities.len()
}

fn has_heading(unit: &ContentUnit) -> bool {
    unit.body.lines().any(|line| line.trim_start().starts_with('#'))
}

fn has_bullets(unit: &ContentUnit) -> bool {
    unit.body.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("- ") || line.starts_with("* ")
    })
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn mean_sentence_words(text: &str) -> f64 {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .collect();
    if sentences.is_empty() {
        return 0.0;
    }
    word_count(text) as f64 / sentences.len() as f64
}

fn mentions_feature(unit: &ContentUnit, needle: &str) -> bool {
    unit.accessibility_features
        .iter()
        .any(|feature| feature.to_lowercase().contains(needle))
}

fn heading_hierarchy_is_sequential(unit: &ContentUnit) -> bool {
    let mut previous = 0usize;
    let mut seen = false;
    for line in unit.body.lines() {
        let line = line.trim_start();
        let depth = line.chars().take_while(|c| *c == '#').count();
        if depth == 0 || !line[depth..].starts_with(' ') {
            continue;
        }
        if depth > previous + 1 && seen {
            return false;
        }
        previous = depth;
        seen = true;
    }
    seen
}
