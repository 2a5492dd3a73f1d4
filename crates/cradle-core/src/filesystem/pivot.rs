//! Root switching via `pivot_root(2)`.

use std::path::Path;

use nix::mount::{MntFlags, umount2};
use nix::unistd::pivot_root;

use cradle_common::error::{CradleError, Result};

/// Swaps the process root for `new_root`, parking the previous root at
/// `put_old`.
///
/// # Errors
///
/// Returns an error if the `pivot_root(2)` syscall fails.
pub fn pivot(new_root: &Path, put_old: &Path) -> Result<()> {
    pivot_root(new_root, put_old).map_err(|e| CradleError::Sys {
        op: "pivot_root",
        source: e,
    })?;
    tracing::info!(new_root = %new_root.display(), "root pivoted");
    Ok(())
}

/// Lazily detaches the parked old root and removes its staging
/// directory.
///
/// Something may still reference the old root transiently, so the
/// unmount is deferred (`MNT_DETACH`). Failures here are logged and
/// swallowed; the container is already isolated.
pub fn detach_old_root(dir_name: &str) {
    let path = format!("/{dir_name}");
    if let Err(e) = umount2(path.as_str(), MntFlags::MNT_DETACH) {
        tracing::debug!(path = %path, error = %e, "old root unmount deferred");
    }
    if let Err(e) = std::fs::remove_dir(&path) {
        tracing::debug!(path = %path, error = %e, "old root staging directory left behind");
    }
}
