//! Merge rules: defaults applied beneath every file and environment source.

use crate::config::PipelineConfig;
use crate::provider::ProviderConfig;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    let pipeline = PipelineConfig::default();
    let provider = ProviderConfig::default();
    Config::builder()
        .set_default("provider.provider_type", provider.provider_type.as_str())?
        .set_default("provider.model", provider.model)?
        .set_default("pipeline.plan_timeout_secs", pipeline.plan_timeout_secs)?
        .set_default("pipeline.content_timeout_secs", pipeline.content_timeout_secs)?
        .set_default("pipeline.grouping_timeout_secs", pipeline.grouping_timeout_secs)?
        .set_default("pipeline.validator_timeout_secs", pipeline.validator_timeout_secs)?
        .set_default("pipeline.guard_grace_ms", pipeline.guard_grace_ms)?
        .set_default("pipeline.attempt_timeout_secs", pipeline.attempt_timeout_secs)?
        .set_default("pipeline.max_attempts", pipeline.max_attempts)?
        .set_default("pipeline.base_delay_ms", pipeline.base_delay_ms)?
        .set_default("pipeline.max_delay_ms", pipeline.max_delay_ms)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
