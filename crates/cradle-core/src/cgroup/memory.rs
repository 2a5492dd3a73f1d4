//! Memory controller files for cgroups v2.

use std::fs;
use std::path::Path;

use cradle_common::error::{CradleError, Result};

/// Converts a megabyte ceiling into the byte value stored in `memory.max`.
#[must_use]
pub const fn limit_bytes(megabytes: u64) -> u64 {
    megabytes * 1024 * 1024
}

/// Enables the memory controller for children of `parent` by writing
/// `+memory` to its `cgroup.subtree_control`.
///
/// The write fails when the controller is already enabled; that condition
/// is tolerated and logged.
pub fn enable_controller(parent: &Path) {
    let control = parent.join("cgroup.subtree_control");
    if let Err(e) = fs::write(&control, "+memory") {
        tracing::debug!(
            path = %control.display(),
            error = %e,
            "memory controller not enabled here (may already be active)"
        );
    }
}

/// Writes the hard memory limit for a group.
///
/// # Errors
///
/// Returns an error if writing to `memory.max` fails.
pub fn set_memory_max(cgroup_path: &Path, bytes: u64) -> Result<()> {
    let limit = cgroup_path.join("memory.max");
    fs::write(&limit, bytes.to_string()).map_err(|e| CradleError::Io {
        path: limit,
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_convert_to_bytes() {
        assert_eq!(limit_bytes(1), 1_048_576);
        assert_eq!(limit_bytes(100), 104_857_600);
        assert_eq!(limit_bytes(0), 0);
    }
}
