//! Container root filesystem construction.
//!
//! Runs inside the child's private mount namespace: switches the process
//! root to the container's tree with `pivot_root(2)` and mounts the
//! kernel pseudo-filesystems a userland expects.

pub mod mount;
pub mod pivot;

use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use nix::unistd::chdir;

use cradle_common::constants::{DNS_NAMESERVERS, OLD_ROOT_DIR};
use cradle_common::error::{CradleError, Result};

/// Replaces the process root with `rootfs`.
///
/// After this returns, no path reachable from the new root leads back to
/// the host's filesystem. Must run inside a private mount namespace.
///
/// # Errors
///
/// Returns an error if any mount, pivot, or directory step fails; only
/// the final old-root cleanup is allowed to fail silently.
pub fn isolate(rootfs: &Path) -> Result<()> {
    mount::make_root_private()?;
    mount::bind_to_self(rootfs)?;

    if let Err(e) = write_resolv_conf(rootfs) {
        tracing::warn!(error = %e, "resolv.conf not written; DNS inside the container may fail");
    }

    let old_root = rootfs.join(OLD_ROOT_DIR);
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(&old_root)
        .map_err(|e| CradleError::Io {
            path: old_root.clone(),
            source: e,
        })?;

    pivot::pivot(rootfs, &old_root)?;
    chdir("/").map_err(|e| CradleError::Sys {
        op: "chdir to new root",
        source: e,
    })?;

    mount::mount_pseudo_filesystems()?;

    // The container is functionally isolated at this point; a busy old
    // root is detached lazily and any leftover is only logged.
    pivot::detach_old_root(OLD_ROOT_DIR);
    Ok(())
}

/// Writes a static `/etc/resolv.conf` into the rootfs so name resolution
/// works over the bridged network.
fn write_resolv_conf(rootfs: &Path) -> Result<()> {
    let etc = rootfs.join("etc");
    fs::create_dir_all(&etc).map_err(|e| CradleError::Io {
        path: etc.clone(),
        source: e,
    })?;

    let path = etc.join("resolv.conf");
    let content: String = DNS_NAMESERVERS
        .iter()
        .map(|ns| format!("nameserver {ns}\n"))
        .collect();
    fs::write(&path, content).map_err(|e| CradleError::Io { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolv_conf_lists_all_nameservers() {
        let rootfs = tempfile::tempdir().unwrap();
        write_resolv_conf(rootfs.path()).unwrap();

        let written = fs::read_to_string(rootfs.path().join("etc/resolv.conf")).unwrap();
        for ns in DNS_NAMESERVERS {
            assert!(written.contains(&format!("nameserver {ns}")));
        }
    }

    #[test]
    fn resolv_conf_creates_etc_when_missing() {
        let rootfs = tempfile::tempdir().unwrap();
        assert!(!rootfs.path().join("etc").exists());
        write_resolv_conf(rootfs.path()).unwrap();
        assert!(rootfs.path().join("etc/resolv.conf").is_file());
    }
}
