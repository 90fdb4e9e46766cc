//! Stage seam: every generation stage runs inside a scope that carries the gateway, the request
//! context, a deadline and a cancellation token.

use crate::error::{Degradation, StageError};
use crate::gateway::Gateway;
use crate::lesson::{GenerationContext, RubricKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Plan,
    Content,
    Representation,
    Design,
    Accessibility,
    /// Caller-requested rewrite of one grouping after generation.
    Refinement,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Plan => "plan",
            StageKind::Content => "content",
            StageKind::Representation => "representation",
            StageKind::Design => "design",
            StageKind::Accessibility => "accessibility",
            StageKind::Refinement => "refinement",
        }
    }
}

impl From<RubricKind> for StageKind {
    fn from(rubric: RubricKind) -> Self {
        match rubric {
            RubricKind::Representation => StageKind::Representation,
            RubricKind::Design => StageKind::Design,
            RubricKind::Accessibility => StageKind::Accessibility,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    /// Some or all of the payload was synthesized after the gateway gave up.
    Fallback,
    /// The stage overran its deadline or was cancelled; the payload is fully synthesized.
    Failed,
}

/// Outcome of one stage as seen by the coordinator. `payload` is always schema-valid.
#[derive(Debug, Clone)]
pub struct StageResult<T> {
    pub kind: StageKind,
    pub status: StageStatus,
    pub payload: T,
    pub diagnostics: Vec<Degradation>,
}

impl<T> StageResult<T> {
    pub fn success(kind: StageKind, payload: T) -> Self {
        Self {
            kind,
            status: StageStatus::Success,
            payload,
            diagnostics: Vec::new(),
        }
    }

    pub fn degraded(
        kind: StageKind,
        status: StageStatus,
        payload: T,
        diagnostics: Vec<Degradation>,
    ) -> Self {
        Self {
            kind,
            status,
            payload,
            diagnostics,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.status != StageStatus::Success
    }
}

/// Everything a stage may use while it runs.
pub struct StageScope<'a> {
    pub run_id: &'a str,
    pub gateway: &'a Gateway,
    pub context: &'a GenerationContext,
    pub deadline: Instant,
    pub cancel: CancellationToken,
}

impl StageScope<'_> {
    pub fn remaining_ms(&self) -> u128 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_millis()
    }
}

/// A generation stage. Stages report failure as a typed error; falling back is the
/// coordinator's decision.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn kind(&self) -> StageKind;

    async fn run(
        &self,
        scope: &StageScope<'_>,
        input: &Self::Input,
    ) -> Result<Self::Output, StageError>;
}
