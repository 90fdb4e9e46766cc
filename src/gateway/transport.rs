//! Transport seam between the gateway and the generative service.

use super::prompt::PromptSpec;
use crate::error::TransportError;
use async_trait::async_trait;
use tokio::time::Instant;

/// Unparsed reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtifact {
    pub content: String,
    pub model: Option<String>,
}

impl RawArtifact {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
        }
    }
}

/// Issues one outbound call. Implementations must not retry.
#[async_trait]
pub trait GenerativeTransport: Send + Sync {
    async fn call(&self, prompt: &PromptSpec, deadline: Instant)
        -> Result<RawArtifact, TransportError>;

    fn name(&self) -> &str;
}
