//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{CliError, PipelineError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &CliError) -> String {
    match e {
        CliError::Pipeline(PipelineError::FatalPlanFailure { reason }) => {
            format!("Lesson generation aborted: the plan could not be produced ({reason})")
        }
        other => other.to_string(),
    }
}
