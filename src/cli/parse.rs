//! CLI parse: clap types for Lessonforge. No behavior; definitions only.

use crate::lesson::{AudienceLevel, CognitiveLevel};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Lessonforge CLI - deadline-bounded lesson generation
#[derive(Parser, Debug)]
#[command(name = "lessonforge")]
#[command(about = "Generate lesson plans, content units and compliance scorecards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a complete lesson
    Generate(GenerateArgs),
    /// Inspect or validate the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Course title
    #[arg(long)]
    pub course: String,

    /// Lesson topic
    #[arg(long)]
    pub topic: String,

    /// Audience level (freshman, sophomore, junior, senior, masters, postgrad)
    #[arg(long)]
    pub audience: AudienceLevel,

    /// Total lesson duration in minutes (9-480)
    #[arg(long)]
    pub duration: u32,

    /// Cognitive level to target; repeat for several
    #[arg(long = "level", required = true)]
    pub levels: Vec<CognitiveLevel>,

    /// File whose contents summarize supporting material
    #[arg(long)]
    pub digest_file: Option<PathBuf>,

    /// Extra instructions for the generator
    #[arg(long)]
    pub requirements: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}
