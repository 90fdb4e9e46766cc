//! The nine instructional groupings, in teaching order.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    GainAttention,
    InformObjectives,
    StimulateRecall,
    PresentContent,
    ProvideGuidance,
    ElicitPerformance,
    ProvideFeedback,
    AssessPerformance,
    EnhanceRetention,
}

impl Grouping {
    pub const COUNT: usize = 9;

    pub const ALL: [Grouping; Grouping::COUNT] = [
        Grouping::GainAttention,
        Grouping::InformObjectives,
        Grouping::StimulateRecall,
        Grouping::PresentContent,
        Grouping::ProvideGuidance,
        Grouping::ElicitPerformance,
        Grouping::ProvideFeedback,
        Grouping::AssessPerformance,
        Grouping::EnhanceRetention,
    ];

    /// Position in teaching order, starting at 1.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1..=9 => Some(Self::ALL[usize::from(number) - 1]),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Grouping::GainAttention => "Gain Attention",
            Grouping::InformObjectives => "Inform Learners of Objectives",
            Grouping::StimulateRecall => "Stimulate Recall of Prior Learning",
            Grouping::PresentContent => "Present the Content",
            Grouping::ProvideGuidance => "Provide Learning Guidance",
            Grouping::ElicitPerformance => "Elicit Performance",
            Grouping::ProvideFeedback => "Provide Feedback",
            Grouping::AssessPerformance => "Assess Performance",
            Grouping::EnhanceRetention => "Enhance Retention and Transfer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Grouping::GainAttention => "Capture learner interest and focus attention on the lesson",
            Grouping::InformObjectives => "Share learning goals and explain their relevance",
            Grouping::StimulateRecall => "Connect new content to existing knowledge",
            Grouping::PresentContent => "Deliver new information and concepts systematically",
            Grouping::ProvideGuidance => "Guide learners through the learning process",
            Grouping::ElicitPerformance => "Have learners practice and demonstrate learning",
            Grouping::ProvideFeedback => "Give constructive feedback on learner performance",
            Grouping::AssessPerformance => "Evaluate learning and understanding",
            Grouping::EnhanceRetention => "Promote long-term retention and real-world transfer",
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.number(), self.name())
    }
}
