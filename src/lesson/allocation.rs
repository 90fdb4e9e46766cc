//! Weighted time allocation across the nine groupings.

use super::context::{AudienceLevel, GenerationContext};
use super::grouping::Grouping;
use serde::{Deserialize, Serialize};

/// Weights for lessons made up entirely of foundational levels.
const FOUNDATIONAL_PROFILE: [f64; Grouping::COUNT] =
    [0.05, 0.05, 0.12, 0.35, 0.15, 0.15, 0.08, 0.05, 0.06];

/// Weights for lessons made up entirely of applied levels.
const APPLIED_PROFILE: [f64; Grouping::COUNT] =
    [0.05, 0.03, 0.08, 0.25, 0.20, 0.25, 0.10, 0.04, 0.06];

fn audience_multiplier(audience: AudienceLevel, grouping: Grouping) -> f64 {
    use Grouping::*;
    match (audience, grouping) {
        (AudienceLevel::Freshman, InformObjectives) => 1.2,
        (AudienceLevel::Freshman, StimulateRecall) => 1.3,
        (AudienceLevel::Freshman, ProvideGuidance) => 1.2,
        (AudienceLevel::Sophomore, InformObjectives | StimulateRecall | ProvideGuidance) => 1.1,
        (AudienceLevel::Senior, ElicitPerformance | AssessPerformance) => 1.1,
        (AudienceLevel::Masters, ElicitPerformance | AssessPerformance) => 1.2,
        (AudienceLevel::Masters, ProvideFeedback) => 1.1,
        (AudienceLevel::Postgrad, PresentContent) => 0.9,
        (AudienceLevel::Postgrad, ElicitPerformance | AssessPerformance) => 1.3,
        _ => 1.0,
    }
}

/// Minutes per grouping. The entries always sum to `total_minutes` and each is at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAllocation {
    total_minutes: u32,
    minutes: [u32; Grouping::COUNT],
}

impl TimeAllocation {
    /// Computes the allocation for a validated context.
    pub fn compute(context: &GenerationContext) -> Self {
        Self::from_weights(context.total_minutes(), &normalized_weights(context))
    }

    fn from_weights(total_minutes: u32, weights: &[f64; Grouping::COUNT]) -> Self {
        let mut minutes = [0u32; Grouping::COUNT];
        let last = Grouping::COUNT - 1;
        for (slot, weight) in minutes.iter_mut().zip(weights.iter()).take(last) {
            *slot = ((weight * f64::from(total_minutes)).round() as u32).max(1);
        }

        // The last grouping takes what is left. Short lessons can leave it empty, in which case
        // minutes are shaved off the largest early groupings.
        let mut assigned: u32 = minutes[..last].iter().sum();
        while assigned >= total_minutes {
            let (largest, _) = minutes[..last]
                .iter()
                .enumerate()
                .fold((0usize, 0u32), |best, (idx, &value)| {
                    if value > best.1 {
                        (idx, value)
                    } else {
                        best
                    }
                });
            if minutes[largest] <= 1 {
                break;
            }
            minutes[largest] -= 1;
            assigned -= 1;
        }
        minutes[last] = total_minutes.saturating_sub(assigned);

        Self {
            total_minutes,
            minutes,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    pub fn minutes(&self, grouping: Grouping) -> u32 {
        self.minutes[grouping.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Grouping, u32)> + '_ {
        Grouping::ALL.into_iter().zip(self.minutes.iter().copied())
    }

    pub fn sum(&self) -> u32 {
        self.minutes.iter().sum()
    }
}

/// Interpolated, audience-adjusted weights renormalized to 1.0.
pub fn normalized_weights(context: &GenerationContext) -> [f64; Grouping::COUNT] {
    let focus = context.applied_focus();
    let mut weights = [0.0f64; Grouping::COUNT];
    for grouping in Grouping::ALL {
        let i = grouping.index();
        let blended = FOUNDATIONAL_PROFILE[i] * (1.0 - focus) + APPLIED_PROFILE[i] * focus;
        weights[i] = blended * audience_multiplier(context.audience(), grouping);
    }
    let total: f64 = weights.iter().sum();
    for weight in weights.iter_mut() {
        *weight /= total;
    }
    weights
}
