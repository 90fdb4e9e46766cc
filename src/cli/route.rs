//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, ConfigCommands, GenerateArgs, OutputFormat};
use crate::cli::presentation::{format_config_toml, format_output_json, format_output_text};
use crate::config::{ConfigLoader, LessonforgeConfig};
use crate::error::CliError;
use crate::lesson::GenerationContext;
use crate::pipeline::Coordinator;
use crate::provider::ChatCompletionsClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runtime context for CLI execution: workspace and effective configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: LessonforgeConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &LessonforgeConfig {
        &self.config
    }

    /// Execute a command; `cancel` stops a running generation.
    pub async fn execute(
        &self,
        command: &Commands,
        cancel: &CancellationToken,
    ) -> Result<String, CliError> {
        match command {
            Commands::Generate(args) => self.handle_generate(args, cancel).await,
            Commands::Config { command } => self.handle_config(*command),
        }
    }

    async fn handle_generate(
        &self,
        args: &GenerateArgs,
        cancel: &CancellationToken,
    ) -> Result<String, CliError> {
        let context = build_context(args, &self.workspace_root)?;
        self.config
            .validate()
            .map_err(|errors| CliError::Validation(join_errors(&errors)))?;

        let transport = ChatCompletionsClient::from_config(&self.config.provider)?;
        info!(
            model = transport.model_name(),
            topic = context.topic(),
            fingerprint = %context.fingerprint(),
            "Generating lesson"
        );
        let coordinator = Coordinator::new(
            Arc::new(transport),
            self.config.pipeline.retry_policy(),
            self.config.pipeline.settings(),
        );

        let output = coordinator.generate_with_cancel(&context, cancel).await?;
        match args.format {
            OutputFormat::Json => format_output_json(&output),
            OutputFormat::Text => Ok(format_output_text(&output)),
        }
    }

    fn handle_config(&self, command: ConfigCommands) -> Result<String, CliError> {
        match command {
            ConfigCommands::Show => format_config_toml(&self.config),
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok("Configuration is valid".to_string()),
                Err(errors) => Err(CliError::Validation(join_errors(&errors))),
            },
        }
    }
}

fn join_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build and validate the generation request from CLI arguments.
pub fn build_context(
    args: &GenerateArgs,
    workspace_root: &std::path::Path,
) -> Result<GenerationContext, CliError> {
    let mut context = GenerationContext::new(
        args.course.as_str(),
        args.topic.as_str(),
        args.audience,
        args.duration,
        args.levels.iter().copied(),
    )?;

    if let Some(ref path) = args.digest_file {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            workspace_root.join(path)
        };
        let digest = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        })?;
        context = context.with_material_digest(digest.trim());
    }
    if let Some(ref requirements) = args.requirements {
        context = context.with_additional_requirements(requirements.as_str())?;
    }
    Ok(context)
}
