//! Mount operations for container filesystem setup.

use std::path::Path;

use nix::mount::{MsFlags, mount};

use cradle_common::error::{CradleError, Result};

/// Marks the current root mount private and recursive, so later mount
/// changes inside the namespace cannot propagate back to the host.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
pub fn make_root_private() -> Result<()> {
    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| CradleError::Sys {
        op: "make root mount private",
        source: e,
    })
}

/// Bind-mounts the rootfs onto itself, recursively.
///
/// `pivot_root(2)` requires the new root to be a mount point; a
/// self-bind satisfies that for a plain directory tree.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
pub fn bind_to_self(rootfs: &Path) -> Result<()> {
    mount(
        Some(rootfs),
        rootfs,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| CradleError::Sys {
        op: "bind mount rootfs onto itself",
        source: e,
    })
}

/// Mounts `proc`, `sysfs`, and `devtmpfs` at their conventional paths
/// under the new root.
///
/// `devtmpfs` brings the common device nodes (`null`, `zero`, `tty`, the
/// standard streams) in a single mount.
///
/// # Errors
///
/// Returns an error if any of the three mounts fails; tooling inside the
/// container commonly depends on all of them.
pub fn mount_pseudo_filesystems() -> Result<()> {
    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| CradleError::Sys {
        op: "mount /proc",
        source: e,
    })?;

    mount(
        Some("sysfs"),
        "/sys",
        Some("sysfs"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| CradleError::Sys {
        op: "mount /sys",
        source: e,
    })?;

    mount(
        Some("devtmpfs"),
        "/dev",
        Some("devtmpfs"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| CradleError::Sys {
        op: "mount /dev",
        source: e,
    })
}
