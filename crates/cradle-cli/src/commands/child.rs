//! `crdl internal-child` — container-side entry point, reached only via
//! the runtime's own re-execution.

use std::path::PathBuf;

use clap::Args;

/// Arguments for the internal child entry point.
#[derive(Args, Debug)]
pub struct ChildArgs {
    /// Path to the container root filesystem.
    pub rootfs: PathBuf,

    /// Command to execute inside the container.
    pub command: String,

    /// Arguments passed through to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes the internal child entry point.
///
/// On success the process image is replaced and this never returns.
///
/// # Errors
///
/// Returns an error when invoked outside the runtime's re-execution or
/// when container setup fails.
pub fn execute(args: ChildArgs) -> anyhow::Result<()> {
    match cradle_runtime::child::run(&args.rootfs, &args.command, &args.args) {
        Ok(never) => match never {},
        Err(e) => Err(anyhow::anyhow!("{e}")),
    }
}
