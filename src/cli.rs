//! CLI domain: parse, route, help, output, and presentation only.
//! No pipeline orchestration; a single route table dispatches to the coordinator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, GenerateArgs, OutputFormat};
pub use presentation::{format_config_toml, format_output_json, format_output_text};
pub use route::{build_context, RunContext};
