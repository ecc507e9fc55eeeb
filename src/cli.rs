//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Dynamic Resolve - Resolve dynamic dependency versions across repositories
#[derive(Parser, Debug)]
#[command(name = "dynamic-resolve")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a dynamic version selector to one concrete version
    Resolve(commands::resolve::ResolveArgs),

    /// List the versions each configured repository knows for a module
    Versions(commands::versions::VersionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level)?;
        let output = dynamic_resolve::output::OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args, &output),
            Commands::Versions(args) => commands::versions::execute(args, &output),
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter: log::LevelFilter = level.parse().map_err(|_| {
        anyhow::anyhow!(
            "Invalid log level '{}': expected error, warn, info, debug or trace",
            level
        )
    })?;
    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
