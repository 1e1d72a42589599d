//! Command implementations and dispatch logic.
//!
//! Each command is an async function that takes a `CommandContext`.

use burr_core::error::{BurrError, BurrResult};
use camino::Utf8PathBuf;
use tracing::info;

pub mod install;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a context for the process working directory
    pub fn new() -> BurrResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| BurrError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| BurrError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("Working directory is not valid UTF-8: {}", path.display()),
        })?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
        })
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> BurrResult<()> {
    match command {
        Commands::Install(args) => {
            info!("Installing {}", args.package);
            install::execute(args, ctx).await
        }
        Commands::Help => show_help(ctx),
    }
}

/// Show help information
pub fn show_help(ctx: &CommandContext) -> BurrResult<()> {
    ctx.output.info("burr - minimal npm package installer");
    ctx.output.info("");
    ctx.output.info("Usage: burr [COMMAND] [OPTIONS]");
    ctx.output.info("");
    ctx.output.info("Commands:");
    ctx.output.info("  install <name>[@range]   Resolve a package and install its dependency tree");
    ctx.output.info("  help                     List available commands");
    ctx.output.info("");
    ctx.output.info("Install options:");
    ctx.output.info("  --dir <DIR>              Destination directory (default: node_modules)");
    ctx.output.info("  --registry <URL>         Registry base URL");
    ctx.output.info("  --concurrency <N>        Maximum simultaneous downloads");
    ctx.output.info("  --max-passes <N>         Upper bound on resolution passes");
    ctx.output.info("");
    ctx.output.info("Run 'burr <command> --help' for more information on a command.");
    Ok(())
}
