//! Generation request context: who the lesson is for and what it must cover.

use crate::error::ContextError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_TITLE_CHARS: usize = 200;
const MAX_REQUIREMENTS_CHARS: usize = 500;
const MIN_DURATION_MINUTES: u32 = 9;
const MAX_DURATION_MINUTES: u32 = 480;

/// Cognitive levels in taxonomy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl CognitiveLevel {
    pub const ALL: [CognitiveLevel; 6] = [
        CognitiveLevel::Remember,
        CognitiveLevel::Understand,
        CognitiveLevel::Apply,
        CognitiveLevel::Analyze,
        CognitiveLevel::Evaluate,
        CognitiveLevel::Create,
    ];

    /// Remember and understand are foundational, everything above is applied.
    pub fn is_foundational(self) -> bool {
        matches!(self, CognitiveLevel::Remember | CognitiveLevel::Understand)
    }

    pub fn complexity(self) -> f64 {
        match self {
            CognitiveLevel::Remember => 0.1,
            CognitiveLevel::Understand => 0.2,
            CognitiveLevel::Apply => 0.4,
            CognitiveLevel::Analyze => 0.6,
            CognitiveLevel::Evaluate => 0.8,
            CognitiveLevel::Create => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CognitiveLevel::Remember => "remember",
            CognitiveLevel::Understand => "understand",
            CognitiveLevel::Apply => "apply",
            CognitiveLevel::Analyze => "analyze",
            CognitiveLevel::Evaluate => "evaluate",
            CognitiveLevel::Create => "create",
        }
    }

    pub fn verbs(self) -> &'static [&'static str] {
        match self {
            CognitiveLevel::Remember => &["define", "list", "recall", "identify"],
            CognitiveLevel::Understand => &["explain", "summarize", "describe", "classify"],
            CognitiveLevel::Apply => &["apply", "demonstrate", "solve", "use"],
            CognitiveLevel::Analyze => &["analyze", "compare", "differentiate", "examine"],
            CognitiveLevel::Evaluate => &["evaluate", "justify", "critique", "assess"],
            CognitiveLevel::Create => &["design", "construct", "formulate", "develop"],
        }
    }
}

impl fmt::Display for CognitiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CognitiveLevel {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        CognitiveLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ContextError::UnknownValue {
                kind: "cognitive level",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Masters,
    Postgrad,
}

impl AudienceLevel {
    pub const ALL: [AudienceLevel; 6] = [
        AudienceLevel::Freshman,
        AudienceLevel::Sophomore,
        AudienceLevel::Junior,
        AudienceLevel::Senior,
        AudienceLevel::Masters,
        AudienceLevel::Postgrad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AudienceLevel::Freshman => "freshman",
            AudienceLevel::Sophomore => "sophomore",
            AudienceLevel::Junior => "junior",
            AudienceLevel::Senior => "senior",
            AudienceLevel::Masters => "masters",
            AudienceLevel::Postgrad => "postgrad",
        }
    }

    /// Scales how many content units a grouping gets.
    pub fn content_factor(self) -> f64 {
        match self {
            AudienceLevel::Freshman => 1.2,
            AudienceLevel::Sophomore => 1.1,
            AudienceLevel::Junior => 1.0,
            AudienceLevel::Senior => 0.9,
            AudienceLevel::Masters => 0.8,
            AudienceLevel::Postgrad => 0.7,
        }
    }

    /// Adjustment to the objective count.
    pub fn objective_adjustment(self) -> i32 {
        match self {
            AudienceLevel::Freshman => -1,
            AudienceLevel::Sophomore | AudienceLevel::Junior => 0,
            AudienceLevel::Senior | AudienceLevel::Masters | AudienceLevel::Postgrad => 1,
        }
    }
}

impl fmt::Display for AudienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudienceLevel {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        AudienceLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ContextError::UnknownValue {
                kind: "audience level",
                value: s.to_string(),
            })
    }
}

/// Immutable, validated input to one pipeline run.
///
/// Deserialization goes through [`GenerationContext::new`], so a decoded context carries the
/// same guarantees as a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGenerationContext")]
pub struct GenerationContext {
    course_title: String,
    topic: String,
    audience: AudienceLevel,
    total_minutes: u32,
    cognitive_levels: Vec<CognitiveLevel>,
    #[serde(default)]
    material_digest: Option<String>,
    #[serde(default)]
    additional_requirements: Option<String>,
}

/// Wire form of [`GenerationContext`] before validation.
#[derive(Deserialize)]
struct RawGenerationContext {
    course_title: String,
    topic: String,
    audience: AudienceLevel,
    total_minutes: u32,
    cognitive_levels: Vec<CognitiveLevel>,
    #[serde(default)]
    material_digest: Option<String>,
    #[serde(default)]
    additional_requirements: Option<String>,
}

impl TryFrom<RawGenerationContext> for GenerationContext {
    type Error = ContextError;

    fn try_from(raw: RawGenerationContext) -> Result<Self, Self::Error> {
        let mut context = GenerationContext::new(
            raw.course_title,
            raw.topic,
            raw.audience,
            raw.total_minutes,
            raw.cognitive_levels,
        )?;
        if let Some(digest) = raw.material_digest {
            context = context.with_material_digest(digest);
        }
        if let Some(requirements) = raw.additional_requirements {
            context = context.with_additional_requirements(requirements)?;
        }
        Ok(context)
    }
}

impl GenerationContext {
    pub fn new(
        course_title: impl Into<String>,
        topic: impl Into<String>,
        audience: AudienceLevel,
        total_minutes: u32,
        cognitive_levels: impl IntoIterator<Item = CognitiveLevel>,
    ) -> Result<Self, ContextError> {
        let course_title = course_title.into().trim().to_string();
        let topic = topic.into().trim().to_string();
        check_text("course_title", &course_title, MAX_TITLE_CHARS)?;
        check_text("topic", &topic, MAX_TITLE_CHARS)?;

        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&total_minutes) {
            return Err(ContextError::DurationOutOfRange(total_minutes));
        }

        let mut cognitive_levels: Vec<CognitiveLevel> = cognitive_levels.into_iter().collect();
        cognitive_levels.sort();
        cognitive_levels.dedup();
        if cognitive_levels.is_empty() {
            return Err(ContextError::NoCognitiveLevels);
        }

        Ok(Self {
            course_title,
            topic,
            audience,
            total_minutes,
            cognitive_levels,
            material_digest: None,
            additional_requirements: None,
        })
    }

    /// Attaches already-extracted course material text.
    pub fn with_material_digest(mut self, digest: impl Into<String>) -> Self {
        let digest = digest.into();
        self.material_digest = (!digest.trim().is_empty()).then_some(digest);
        self
    }

    pub fn with_additional_requirements(
        mut self,
        requirements: impl Into<String>,
    ) -> Result<Self, ContextError> {
        let requirements = requirements.into().trim().to_string();
        if requirements.chars().count() > MAX_REQUIREMENTS_CHARS {
            return Err(ContextError::TooLong {
                field: "additional_requirements",
                max: MAX_REQUIREMENTS_CHARS,
            });
        }
        self.additional_requirements = (!requirements.is_empty()).then_some(requirements);
        Ok(self)
    }

    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn audience(&self) -> AudienceLevel {
        self.audience
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    pub fn cognitive_levels(&self) -> &[CognitiveLevel] {
        &self.cognitive_levels
    }

    pub fn material_digest(&self) -> Option<&str> {
        self.material_digest.as_deref()
    }

    pub fn additional_requirements(&self) -> Option<&str> {
        self.additional_requirements.as_deref()
    }

    /// Share of selected levels that are applied rather than foundational.
    pub fn applied_focus(&self) -> f64 {
        let applied = self
            .cognitive_levels
            .iter()
            .filter(|level| !level.is_foundational())
            .count();
        applied as f64 / self.cognitive_levels.len() as f64
    }

    /// Stable blake3 digest of the canonical JSON form.
    pub fn fingerprint(&self) -> String {
        // Struct field order is fixed, so the serialized form is canonical.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(blake3::hash(&bytes).as_bytes())
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ContextError> {
    if value.is_empty() {
        return Err(ContextError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ContextError::TooLong { field, max });
    }
    Ok(())
}
