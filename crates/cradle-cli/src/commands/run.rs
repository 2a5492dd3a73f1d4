//! `crdl run` — launch a container.

use std::path::PathBuf;

use clap::Args;

use cradle_common::constants::DEFAULT_MEMORY_LIMIT_MB;
use cradle_common::types::LaunchSpec;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the container root filesystem.
    pub rootfs: PathBuf,

    /// Command to execute inside the container.
    pub command: String,

    /// Arguments passed through to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Memory ceiling for the container, in megabytes.
    #[arg(long, default_value_t = DEFAULT_MEMORY_LIMIT_MB)]
    pub memory: u64,
}

/// Executes the `run` command.
///
/// The container's standard streams pass through untouched; its exit
/// code becomes this process's exit code.
///
/// # Errors
///
/// Returns an error if the launch fails before the container command
/// starts.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let spec = LaunchSpec {
        rootfs: args.rootfs,
        command: args.command,
        args: args.args,
        memory_limit_mb: args.memory,
    };

    let code = cradle_runtime::launcher::launch(&spec).map_err(|e| anyhow::anyhow!("{e}"))?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
