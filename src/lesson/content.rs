//! Content units and the enhancement patches validators attach to them.

use super::context::AudienceLevel;
use super::grouping::Grouping;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Visual,
    Auditory,
    Textual,
    Interactive,
    Kinesthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Introduction,
    ConceptExplanation,
    ActivityGuide,
    Assessment,
    Reflection,
    #[default]
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
    Image,
    Diagram,
    Chart,
    Video,
    Animation,
    Interactive,
    CodeSnippet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualElement {
    pub kind: VisualKind,
    pub description: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Presentation hints set by the design validator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_spacing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_style: Option<String>,
}

impl UnitStyle {
    /// Copies every field `other` sets over this one.
    pub fn overlay(&mut self, other: &UnitStyle) {
        fn take(slot: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        take(&mut self.font_family, &other.font_family);
        take(&mut self.font_size, &other.font_size);
        take(&mut self.heading_color, &other.heading_color);
        take(&mut self.text_color, &other.text_color);
        take(&mut self.background_color, &other.background_color);
        take(&mut self.line_height, &other.line_height);
        take(&mut self.text_align, &other.text_align);
        take(&mut self.section_spacing, &other.section_spacing);
        take(&mut self.bullet_style, &other.bullet_style);
    }
}

/// One unit as returned by the generative service. It carries no identity: the content stage
/// assigns grouping and sequence from the branch that requested it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub kind: UnitKind,
    #[serde(default)]
    pub modalities: Vec<Modality>,
    pub duration_minutes: f64,
    #[serde(default)]
    pub visuals: Vec<VisualElement>,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub speaker_notes: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub accessibility_features: Vec<String>,
}

/// Reply shape of one content call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitBatch {
    pub units: Vec<UnitDraft>,
}

/// Stable identity of a unit within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub grouping: Grouping,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub grouping: Grouping,
    pub sequence: u32,
    pub title: String,
    pub body: String,
    pub kind: UnitKind,
    pub modalities: Vec<Modality>,
    pub duration_minutes: f64,
    pub visuals: Vec<VisualElement>,
    pub narration: Option<String>,
    pub speaker_notes: Option<String>,
    pub key_points: Vec<String>,
    pub activities: Vec<String>,
    pub accessibility_features: Vec<String>,
    #[serde(default)]
    pub style: UnitStyle,
}

impl ContentUnit {
    pub fn from_draft(grouping: Grouping, sequence: u32, draft: UnitDraft) -> Self {
        Self {
            grouping,
            sequence,
            title: draft.title,
            body: draft.body,
            kind: draft.kind,
            modalities: draft.modalities,
            duration_minutes: draft.duration_minutes,
            visuals: draft.visuals,
            narration: draft.narration,
            speaker_notes: draft.speaker_notes,
            key_points: draft.key_points,
            activities: draft.activities,
            accessibility_features: draft.accessibility_features,
            style: UnitStyle::default(),
        }
    }

    pub fn id(&self) -> UnitId {
        UnitId {
            grouping: self.grouping,
            sequence: self.sequence,
        }
    }

    pub fn apply(&mut self, patch: &UnitPatch) {
        if let Some(narration) = &patch.narration {
            self.narration = Some(narration.clone());
        }
        if let Some(notes) = &patch.speaker_notes {
            self.speaker_notes = Some(notes.clone());
        }
        if let Some(activities) = &patch.activities {
            self.activities.clone_from(activities);
        }
        if let Some(visuals) = &patch.visuals {
            self.visuals.clone_from(visuals);
        }
        if let Some(modalities) = &patch.modalities {
            self.modalities.clone_from(modalities);
        }
        if let Some(features) = &patch.accessibility_features {
            self.accessibility_features.clone_from(features);
        }
        if let Some(style) = &patch.style {
            self.style.overlay(style);
        }
    }
}

/// Field replacements for one unit. Every field that is set replaces the unit's value outright.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitPatch {
    pub unit: Option<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visuals: Option<Vec<VisualElement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<UnitStyle>,
}

impl UnitPatch {
    pub fn for_unit(id: UnitId) -> Self {
        Self {
            unit: Some(id),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.narration.is_none()
            && self.speaker_notes.is_none()
            && self.activities.is_none()
            && self.visuals.is_none()
            && self.modalities.is_none()
            && self.accessibility_features.is_none()
            && self.style.is_none()
    }
}

const BASE_UNIT_COUNTS: [u32; Grouping::COUNT] = [2, 1, 2, 4, 3, 3, 2, 2, 2];

/// Number of units to request for one grouping.
pub fn unit_count(
    grouping: Grouping,
    minutes: u32,
    activities: usize,
    audience: AudienceLevel,
) -> u32 {
    let base = BASE_UNIT_COUNTS[grouping.index()];
    let duration_factor = (minutes / 15).max(1);
    let activity_factor = (activities / 2).clamp(1, 2) as u32;
    let raw = f64::from(base * duration_factor * activity_factor) * audience.content_factor();
    let min = (base / 2).max(1);
    let max = base * 3;
    (raw.round() as u32).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> ContentUnit {
        ContentUnit::from_draft(
            Grouping::PresentContent,
            2,
            UnitDraft {
                title: "Mitosis".into(),
                body: "## Phases".into(),
                kind: UnitKind::ConceptExplanation,
                modalities: vec![Modality::Textual],
                duration_minutes: 5.0,
                visuals: vec![],
                narration: None,
                speaker_notes: None,
                key_points: vec![],
                activities: vec!["Read".into()],
                accessibility_features: vec![],
            },
        )
    }

    #[test]
    fn patch_replaces_set_fields_only() {
        let mut unit = unit();
        let mut patch = UnitPatch::for_unit(unit.id());
        patch.narration = Some("Listen".into());
        patch.style = Some(UnitStyle {
            text_align: Some("left".into()),
            ..Default::default()
        });
        unit.apply(&patch);
        assert_eq!(unit.narration.as_deref(), Some("Listen"));
        assert_eq!(unit.activities, vec!["Read".to_string()]);
        assert_eq!(unit.style.text_align.as_deref(), Some("left"));

        let mut second = UnitPatch::for_unit(unit.id());
        second.style = Some(UnitStyle {
            font_size: Some("18px".into()),
            ..Default::default()
        });
        unit.apply(&second);
        assert_eq!(unit.style.text_align.as_deref(), Some("left"));
        assert_eq!(unit.style.font_size.as_deref(), Some("18px"));
    }

    #[test]
    fn unit_count_respects_bounds() {
        // 4 base, 30 minutes -> factor 2, 4 activities -> factor 2, junior.
        assert_eq!(unit_count(Grouping::PresentContent, 30, 4, AudienceLevel::Junior), 12);
        // Floor of one for single-unit groupings.
        assert_eq!(unit_count(Grouping::InformObjectives, 1, 0, AudienceLevel::Postgrad), 1);
        // Cap at three times base.
        assert_eq!(unit_count(Grouping::GainAttention, 480, 10, AudienceLevel::Freshman), 6);
        assert_eq!(unit_count(Grouping::ElicitPerformance, 10, 1, AudienceLevel::Masters), 2);
    }
}
