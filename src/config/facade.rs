//! Configuration loading entry point.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::LessonforgeConfig;
use crate::error::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`LessonforgeConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/{LESSONFORGE_ENV}.toml`, `LESSONFORGE__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<LessonforgeConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: LessonforgeConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            provider = %config.provider.provider_type,
            model = %config.provider.model,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load a single file on top of the defaults, skipping every other source.
    pub fn load_from_file(path: &Path) -> Result<LessonforgeConfig, ConfigError> {
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Path of the user-level config file, whether or not it exists.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
