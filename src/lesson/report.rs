//! Compliance scorecards produced by the validators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Principles scoring below this get recommendations and enhancements.
pub const COMPLIANCE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricKind {
    Representation,
    Design,
    Accessibility,
}

impl RubricKind {
    /// Order in which enhancements are merged.
    pub const MERGE_ORDER: [RubricKind; 3] = [
        RubricKind::Representation,
        RubricKind::Design,
        RubricKind::Accessibility,
    ];

    pub fn principles(self) -> &'static [&'static str] {
        match self {
            RubricKind::Representation => &["representation", "action_expression", "engagement"],
            RubricKind::Design => &["contrast", "repetition", "alignment", "proximity"],
            RubricKind::Accessibility => &["perceivable", "operable", "understandable", "robust"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RubricKind::Representation => "representation",
            RubricKind::Design => "design",
            RubricKind::Accessibility => "accessibility",
        }
    }
}

impl fmt::Display for RubricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub principle: String,
    pub priority: Priority,
    pub text: String,
}

impl Recommendation {
    pub fn new(principle: impl Into<String>, priority: Priority, text: impl Into<String>) -> Self {
        Self {
            principle: principle.into(),
            priority,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl ComplianceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ComplianceLevel::Excellent
        } else if score >= 0.8 {
            ComplianceLevel::Good
        } else if score >= COMPLIANCE_THRESHOLD {
            ComplianceLevel::Fair
        } else if score >= 0.5 {
            ComplianceLevel::Poor
        } else {
            ComplianceLevel::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rubric: RubricKind,
    pub scores: BTreeMap<String, f64>,
    pub overall: f64,
    pub level: ComplianceLevel,
    pub recommendations: Vec<Recommendation>,
}

impl ValidationReport {
    /// Builds a report whose overall score is the mean of `scores`.
    pub fn from_scores(
        rubric: RubricKind,
        scores: BTreeMap<String, f64>,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        let scores: BTreeMap<String, f64> = scores
            .into_iter()
            .map(|(principle, score)| (principle, score.clamp(0.0, 1.0)))
            .collect();
        let overall = mean(scores.values().copied());
        Self {
            rubric,
            scores,
            overall,
            level: ComplianceLevel::from_score(overall),
            recommendations,
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.overall >= COMPLIANCE_THRESHOLD
    }

    /// Appends recommendations whose text is not already present.
    pub fn merge_recommendations(&mut self, extra: impl IntoIterator<Item = Recommendation>) {
        for recommendation in extra {
            if !self
                .recommendations
                .iter()
                .any(|existing| existing.text == recommendation.text)
            {
                self.recommendations.push(recommendation);
            }
        }
    }
}

/// Reply shape of a validator's review call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub summary: Option<String>,
    pub recommendations: Vec<Recommendation>,
}

pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
