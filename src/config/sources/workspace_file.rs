//! Per-workspace config files under `config/`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "config";
const ENV_VAR: &str = "LESSONFORGE_ENV";
const DEFAULT_ENV: &str = "development";

/// Name of the active environment overlay.
pub fn active_environment() -> String {
    std::env::var(ENV_VAR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

/// Candidate files in ascending precedence: the shared base, then the environment overlay.
pub fn candidate_paths(workspace_root: &Path) -> [PathBuf; 2] {
    let dir = workspace_root.join(CONFIG_DIR);
    [
        dir.join("config.toml"),
        dir.join(format!("{}.toml", active_environment())),
    ]
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = candidate_paths(workspace_root)
        .iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path.as_path()).required(false))
        });
    Ok(builder)
}
