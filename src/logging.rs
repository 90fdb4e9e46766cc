//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber. Level, format and destination come from
//! [`LoggingConfig`] and can be overridden through the `LESSONFORGE_LOG`,
//! `LESSONFORGE_LOG_MODULES`, `LESSONFORGE_LOG_FORMAT` and `LESSONFORGE_LOG_OUTPUT` variables.
//! Records go to stderr unless told otherwise; stdout is reserved for generated lessons.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

const ENV_FILTER: &str = "LESSONFORGE_LOG";
const ENV_MODULES: &str = "LESSONFORGE_LOG_MODULES";
const ENV_FORMAT: &str = "LESSONFORGE_LOG_FORMAT";
const ENV_OUTPUT: &str = "LESSONFORGE_LOG_OUTPUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error, off.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
    /// `stdout`, `stderr`, `file` or `both` (stdout and stderr).
    pub output: String,
    /// Used when `output = "file"`.
    pub file: PathBuf,
    /// ANSI colors for text records on a terminal stream.
    pub color: bool,
    /// Per-module level overrides, e.g. `"lessonforge::gateway" = "debug"`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text.as_str().to_string(),
            output: LogOutput::Stderr.as_str().to_string(),
            file: PathBuf::from("lessonforge.log"),
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Checks values without consulting the environment.
    pub fn validate(&self) -> Result<(), String> {
        check_level(&self.level)?;
        self.format.parse::<LogFormat>()?;
        self.output.parse::<LogOutput>()?;
        for (module, level) in &self.modules {
            check_level(level).map_err(|e| format!("module {}: {}", module, e))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Invalid log format: {} (expected text or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    File,
    Both,
}

impl LogOutput {
    fn as_str(self) -> &'static str {
        match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::Both => "both",
        }
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            other => Err(format!(
                "Invalid log output: {} (expected stdout, stderr, file or both)",
                other
            )),
        }
    }
}

fn check_level(level: &str) -> Result<(), String> {
    if LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(format!(
            "Invalid log level: {} (expected one of {})",
            level,
            LEVELS.join(", ")
        ))
    }
}

/// Installs the global subscriber.
///
/// Environment variables win over `config`; CLI flags are expected to have been folded into
/// `config` already. Fails if a subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = build_filter(config)?;
    let format = env_or(ENV_FORMAT, &config.format)
        .parse::<LogFormat>()
        .map_err(ConfigError::Invalid)?;
    let output = env_or(ENV_OUTPUT, &config.output)
        .parse::<LogOutput>()
        .map_err(ConfigError::Invalid)?;

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Both => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File => BoxMakeWriter::new(open_log_file(&config.file)?),
    };

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color && output != LogOutput::File)
                    .with_writer(writer),
            )
            .try_init(),
    };

    installed.map_err(|e| ConfigError::Invalid(format!("Failed to initialize logging: {}", e)))
}

/// Reads `var`, falling back to `configured` when unset.
fn env_or(var: &str, configured: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| configured.to_string())
}

fn open_log_file(path: &Path) -> Result<Mutex<File>, ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Mutex::new(file))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let env_modules = std::env::var(ENV_MODULES).unwrap_or_default();
    let env_pairs = env_modules
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(module, level)| (module.trim(), level.trim()));
    let config_pairs = config
        .modules
        .iter()
        .map(|(module, level)| (module.as_str(), level.as_str()));

    config_pairs
        .chain(env_pairs)
        .try_fold(EnvFilter::new(&config.level), |filter, (module, level)| {
            Ok(filter.add_directive(directive(module, level)?))
        })
}

fn directive(module: &str, level: &str) -> Result<Directive, ConfigError> {
    format!("{}={}", module, level).parse().map_err(|e| {
        ConfigError::Invalid(format!("Invalid log directive {}={}: {}", module, level, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_text_to_stderr() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
        assert!(config.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn output_names_parse() {
        assert_eq!("stderr".parse::<LogOutput>(), Ok(LogOutput::Stderr));
        assert_eq!("both".parse::<LogOutput>(), Ok(LogOutput::Both));
        assert_eq!("file".parse::<LogOutput>(), Ok(LogOutput::File));
        assert!("syslog".parse::<LogOutput>().is_err());
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.output, "stderr");
    }

    #[test]
    fn validate_rejects_unknown_values() {
        let mut config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.level = "debug".to_string();
        config.format = "xml".to_string();
        assert!(config.validate().is_err());

        config.format = "json".to_string();
        config
            .modules
            .insert("lessonforge::gateway".to_string(), "chatty".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.contains("lessonforge::gateway"));
    }
}
