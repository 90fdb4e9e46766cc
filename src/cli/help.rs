//! CLI command-name contract for logging.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string for log fields (e.g. "generate", "config.show").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate(_) => "generate",
        Commands::Config { command } => match command {
            ConfigCommands::Show => "config.show",
            ConfigCommands::Validate => "config.validate",
        },
    }
}
