//! Lesson generation pipeline.
//!
//! Plan, then content fanned out per grouping, then three validators running side by side, then
//! reconciliation. Each stage has a deadline and a fallback except the plan, whose failure
//! aborts the run. Finished lessons can be re-validated or have one grouping refined.

pub mod content_stage;
pub mod coordinator;
pub mod plan_stage;
pub mod reconciler;
pub mod refine_stage;
pub mod stage;
pub mod validators;

pub use content_stage::{ContentStage, GroupingOutcome, GroupingRequest};
pub use coordinator::{Coordinator, PipelineSettings, PipelineState};
pub use plan_stage::PlanStage;
pub use reconciler::{
    AggregateOutput, GroupingSummary, Reconciler, RunParts, StageSummary, ValidationReports,
    ValidationRun, ValidatorResults,
};
pub use refine_stage::{RefineStage, RefinementOutcome, RefinementRequest};
pub use stage::{Stage, StageKind, StageResult, StageScope, StageStatus};
pub use validators::{ValidatorOutcome, ValidatorStage};
