//! Error types for the lesson generation pipeline.

use crate::lesson::Grouping;
use crate::pipeline::StageKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the generative call gateway.
///
/// These never leave the pipeline: the coordinator resolves every one of them into either a
/// fallback artifact or a [`PipelineError::FatalPlanFailure`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Gateway call timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("Malformed reply for schema '{schema}' after {attempts} attempt(s): {detail}")]
    MalformedReply {
        schema: String,
        attempts: u32,
        detail: String,
    },

    #[error("Generative service error after {attempts} attempt(s): {message}")]
    ServiceError { attempts: u32, message: String },
}

/// Errors raised by a transport while issuing one outbound call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Statuses that will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => !matches!(status, 400 | 401 | 403 | 404),
            TransportError::Timeout | TransportError::Connection(_) | TransportError::Protocol(_) => {
                true
            }
        }
    }
}

/// A reply that parsed but does not satisfy its schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SchemaViolation(pub String);

impl SchemaViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors a stage hands back to the coordinator.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Deadline elapsed for {0} stage")]
    DeadlineElapsed(StageKind),

    #[error("{0} stage was cancelled")]
    Cancelled(StageKind),
}

/// The only error that crosses the coordinator boundary.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Plan stage failed, pipeline aborted: {reason}")]
    FatalPlanFailure { reason: String },
}

/// Non-fatal failures absorbed by the pipeline and surfaced as diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    #[error("{stage} stage degraded: {reason}")]
    StageDegraded { stage: StageKind, reason: String },

    #[error("Grouping {grouping} degraded: {reason}")]
    GroupingDegraded { grouping: Grouping, reason: String },
}

/// Invalid generation request input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Total duration {0} minutes is outside 9..=480")]
    DurationOutOfRange(u32),

    #[error("At least one cognitive level must be selected")]
    NoCognitiveLevels,

    #[error("Unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

/// Configuration and startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Configuration validation failed:\n{0}")]
    Validation(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Serialization(String),
}
