//! Lesson plan artifact and objective sizing.

use super::allocation::TimeAllocation;
use super::context::{AudienceLevel, CognitiveLevel, GenerationContext};
use super::grouping::Grouping;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub level: CognitiveLevel,
    pub statement: String,
    #[serde(default)]
    pub action_verb: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub criteria: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LessonOverview {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub assessment_methods: Vec<String>,
    #[serde(default)]
    pub differentiation_strategies: Vec<String>,
    #[serde(default)]
    pub closure_activities: Vec<String>,
}

/// One grouping entry as returned by the generative service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingDraft {
    pub number: u8,
    pub activities: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub assessment_strategy: Option<String>,
}

/// Reply shape of the plan call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub overview: LessonOverview,
    pub objectives: Vec<Objective>,
    pub groupings: Vec<GroupingDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingPlan {
    pub grouping: Grouping,
    pub name: String,
    pub description: String,
    pub minutes: u32,
    pub activities: Vec<String>,
    pub materials: Vec<String>,
    pub assessment_strategy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanArtifact {
    pub overview: LessonOverview,
    pub objectives: Vec<Objective>,
    pub groupings: Vec<GroupingPlan>,
    pub allocation: TimeAllocation,
}

impl PlanArtifact {
    /// Combines a schema-valid draft with the locally computed allocation.
    ///
    /// Grouping entries are re-keyed by number so the result always holds the nine groupings in
    /// teaching order with the allocated minutes, whatever order the reply used.
    pub fn assemble(draft: PlanDraft, allocation: TimeAllocation) -> Self {
        let PlanDraft {
            overview,
            objectives,
            mut groupings,
        } = draft;
        groupings.sort_by_key(|entry| entry.number);

        let groupings = Grouping::ALL
            .into_iter()
            .map(|grouping| {
                let entry = groupings
                    .iter()
                    .find(|entry| entry.number == grouping.number());
                GroupingPlan {
                    grouping,
                    name: grouping.name().to_string(),
                    description: grouping.description().to_string(),
                    minutes: allocation.minutes(grouping),
                    activities: entry.map(|e| e.activities.clone()).unwrap_or_default(),
                    materials: entry.map(|e| e.materials.clone()).unwrap_or_default(),
                    assessment_strategy: entry.and_then(|e| e.assessment_strategy.clone()),
                }
            })
            .collect();

        Self {
            overview,
            objectives,
            groupings,
            allocation,
        }
    }

    pub fn grouping(&self, grouping: Grouping) -> Option<&GroupingPlan> {
        self.groupings.iter().find(|plan| plan.grouping == grouping)
    }
}

/// How many objectives the plan should ask for and how they spread over the levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectiveTarget {
    pub count: usize,
    pub distribution: Vec<(CognitiveLevel, usize)>,
}

const DISTRIBUTION_PRIORITY: [CognitiveLevel; 6] = [
    CognitiveLevel::Understand,
    CognitiveLevel::Apply,
    CognitiveLevel::Analyze,
    CognitiveLevel::Remember,
    CognitiveLevel::Evaluate,
    CognitiveLevel::Create,
];

impl ObjectiveTarget {
    pub fn for_context(context: &GenerationContext) -> Self {
        let levels = context.cognitive_levels();
        let count = optimal_objective_count(context.total_minutes(), context.audience(), levels);

        let mut distribution: Vec<(CognitiveLevel, usize)> =
            levels.iter().map(|level| (*level, 1)).collect();
        let remaining = count.saturating_sub(levels.len());
        let priority: Vec<CognitiveLevel> = DISTRIBUTION_PRIORITY
            .into_iter()
            .filter(|level| levels.contains(level))
            .collect();
        for level in priority.iter().cycle().take(remaining) {
            if let Some(slot) = distribution.iter_mut().find(|(l, _)| l == level) {
                slot.1 += 1;
            }
        }

        Self {
            count,
            distribution,
        }
    }
}

fn optimal_objective_count(
    minutes: u32,
    audience: AudienceLevel,
    levels: &[CognitiveLevel],
) -> usize {
    let mut count: i32 = match minutes {
        0..=30 => 2,
        31..=60 => 3,
        61..=90 => 4,
        91..=120 => 5,
        _ => 6,
    };

    if !levels.is_empty() {
        let complexity =
            levels.iter().map(|level| level.complexity()).sum::<f64>() / levels.len() as f64;
        if complexity > 0.7 {
            count = (count - 1).max(2);
        } else if complexity < 0.3 {
            count = (count + 1).min(6);
        }
    }

    count += audience.objective_adjustment();

    let floor = 2.max(levels.len().min(3)) as i32;
    let count = count.clamp(floor, 6) as usize;
    count.max(levels.len())
}
