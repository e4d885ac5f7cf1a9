//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use component_vault::output::OutputConfig;

use crate::commands;

/// Component Vault - Back up and restore connection components
#[derive(Parser, Debug)]
#[command(name = "component-vault")]
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
    /// Back up connection components from a configuration document
    Backup(commands::backup::BackupArgs),

    /// Restore connection components into a configuration document
    Restore(commands::restore::RestoreArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Backup(args) => commands::backup::execute(args, &output),
            Commands::Restore(args) => commands::restore::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Warn);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .try_init();
}
