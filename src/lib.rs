//! Lessonforge: Deadline-Bounded Lesson Generation
//!
//! Turns a course request into a structured lesson plan, per-grouping content units and three
//! compliance scorecards through a staged pipeline of generative calls. Every stage has a
//! deadline and a fallback, so a run either aborts on plan failure or completes, possibly
//! degraded.

pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod lesson;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod telemetry;

pub use error::{Degradation, GatewayError, PipelineError};
pub use lesson::{AudienceLevel, CognitiveLevel, GenerationContext};
pub use pipeline::{AggregateOutput, Coordinator, PipelineSettings};
