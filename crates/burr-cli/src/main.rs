//! # burr
//!
//! Minimal npm-registry package installer.
//!
//! This is the main entry point for the burr CLI. It parses the command line,
//! sets up logging and the panic hook, and dispatches to the command handlers.

use std::process::ExitCode;

use burr_core::error::{BurrError, BurrResult};
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::install::InstallArgs;
use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Minimal npm-registry package installer
#[derive(Parser)]
#[command(name = "burr", version, about = "Resolve and install npm packages", disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a package and install its dependency tree
    Install(InstallArgs),
    /// List available commands
    Help,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    debug!("Starting burr v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&error));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> BurrResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BurrError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new()?;

        match cli.command {
            Some(command) => commands::dispatch_command(command, &ctx).await,
            None => commands::show_help(&ctx),
        }
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "burr={level},burr_core={level},burr_config={level},burr_registry={level},burr_resolver={level},burr_install={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("burr encountered an unexpected error: {}", panic_info);
        eprintln!("burr crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/burr-pm/burr/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
