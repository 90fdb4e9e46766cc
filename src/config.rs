//! Configuration System
//!
//! Layered configuration for the provider, pipeline deadlines, retry policy and logging.
//! Sources merge in order: defaults, global file, workspace files, environment.

use crate::gateway::RetryPolicy;
use crate::pipeline::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::logging::LoggingConfig;
pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonforgeConfig {
    /// Generative service
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Stage deadlines and retry policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stage deadlines and gateway retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub plan_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub grouping_timeout_secs: u64,
    pub validator_timeout_secs: u64,
    pub guard_grace_ms: u64,
    pub attempt_timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plan_timeout_secs: 180,
            content_timeout_secs: 300,
            grouping_timeout_secs: 240,
            validator_timeout_secs: 120,
            guard_grace_ms: 500,
            attempt_timeout_secs: 90,
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

impl PipelineConfig {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            plan_timeout: Duration::from_secs(self.plan_timeout_secs),
            content_timeout: Duration::from_secs(self.content_timeout_secs),
            grouping_timeout: Duration::from_secs(self.grouping_timeout_secs),
            validator_timeout: Duration::from_secs(self.validator_timeout_secs),
            guard_grace: Duration::from_millis(self.guard_grace_ms),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let deadlines = [
            ("plan_timeout_secs", self.plan_timeout_secs),
            ("content_timeout_secs", self.content_timeout_secs),
            ("grouping_timeout_secs", self.grouping_timeout_secs),
            ("validator_timeout_secs", self.validator_timeout_secs),
            ("attempt_timeout_secs", self.attempt_timeout_secs),
        ];
        if let Some((name, _)) = deadlines.iter().find(|(_, secs)| *secs == 0) {
            return Err(format!("{} must be greater than zero", name));
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Provider(String),
    Pipeline(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

fn validate_provider(provider: &ProviderConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if provider.model.trim().is_empty() {
        errors.push("model cannot be empty".to_string());
    }
    match provider.resolve_base_url() {
        Ok(url) => {
            if reqwest::Url::parse(&url).is_err() {
                errors.push(format!("invalid base_url '{}'", url));
            }
        }
        Err(e) => errors.push(e.to_string()),
    }
    if let Some(temperature) = provider.default_options.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            errors.push(format!("temperature {} outside 0.0-2.0", temperature));
        }
    }
    errors
}

impl LessonforgeConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors: Vec<ValidationError> = validate_provider(&self.provider)
            .into_iter()
            .map(ValidationError::Provider)
            .collect();

        if let Err(e) = self.pipeline.validate() {
            errors.push(ValidationError::Pipeline(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
