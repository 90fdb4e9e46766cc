//! Lesson domain: request context, groupings, time allocation and the artifacts each stage
//! produces.

pub mod allocation;
pub mod content;
pub mod context;
pub mod grouping;
pub mod plan;
pub mod report;

pub use allocation::TimeAllocation;
pub use content::{
    ContentUnit, Modality, UnitBatch, UnitDraft, UnitId, UnitKind, UnitPatch, UnitStyle,
    VisualElement, VisualKind,
};
pub use context::{AudienceLevel, CognitiveLevel, GenerationContext};
pub use grouping::Grouping;
pub use plan::{GroupingPlan, LessonOverview, Objective, ObjectiveTarget, PlanArtifact, PlanDraft};
pub use report::{Recommendation, ReviewDraft, RubricKind, ValidationReport};
