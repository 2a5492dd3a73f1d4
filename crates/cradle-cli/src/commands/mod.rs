//! CLI command definitions and dispatch.

pub mod child;
pub mod run;

use clap::{Parser, Subcommand};

/// cradle — minimal container runtime.
#[derive(Parser, Debug)]
#[command(name = "crdl", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch a command inside an isolated container.
    Run(run::RunArgs),
    /// Internal re-exec entry point; never invoked directly by users.
    #[command(name = "internal-child", hide = true)]
    InternalChild(child::ChildArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::execute(args),
        Command::InternalChild(args) => child::execute(args),
    }
}
