//! Lessonforge CLI Binary
//!
//! Command-line interface for the lesson generation pipeline.

use anyhow::Context;
use clap::Parser;
use lessonforge::cli::{command_name, map_error, Cli, RunContext};
use lessonforge::config::ConfigLoader;
use lessonforge::logging::{init_logging, LoggingConfig};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let command = command_name(&cli.command);
    info!(command, "Lessonforge CLI starting");

    match run(&cli) {
        Ok(output) => {
            info!(command, "Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!(command, error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let context = RunContext::new(cli.workspace.clone(), cli.config.clone())
            .map_err(|e| anyhow::anyhow!(map_error(&e)))
            .context("Error initializing workspace")?;

        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling run");
                    cancel.cancel();
                }
            })
        };

        let result = context.execute(&cli.command, &cancel).await;
        interrupt.abort();
        result.map_err(|e| anyhow::anyhow!(map_error(&e)))
    })
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.workspace),
    };
    let mut config = loaded.map(|c| c.logging).unwrap_or_default();

    if cli.quiet {
        config.level = "off".to_string();
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}
