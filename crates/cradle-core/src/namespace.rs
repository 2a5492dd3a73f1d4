//! Namespace selection for the container's spawn call.
//!
//! The child is created directly into its namespaces by passing clone
//! flags at spawn time; the parent keeps the host's view throughout.

use nix::sched::CloneFlags;
use nix::unistd::sethostname;

use cradle_common::error::{CradleError, Result};

/// Which namespaces the child process is created under.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct NamespaceSet {
    /// Isolate the process-ID space; the child becomes PID 1.
    pub pid: bool,
    /// Isolate the mount table.
    pub mount: bool,
    /// Isolate the hostname (UTS).
    pub uts: bool,
    /// Isolate the network stack.
    pub network: bool,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self {
            pid: true,
            mount: true,
            uts: true,
            network: true,
        }
    }
}

impl NamespaceSet {
    /// Translates the selection into flags for `clone(2)`.
    #[must_use]
    pub fn to_clone_flags(&self) -> CloneFlags {
        let mut flags = CloneFlags::empty();
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        flags
    }
}

/// Sets the hostname inside the container's UTS namespace.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails.
pub fn set_hostname(hostname: &str) -> Result<()> {
    sethostname(hostname).map_err(|e| CradleError::Sys {
        op: "sethostname",
        source: e,
    })?;
    tracing::debug!(hostname, "container hostname set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_isolates_all_four() {
        let flags = NamespaceSet::default().to_clone_flags();
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWUTS));
        assert!(flags.contains(CloneFlags::CLONE_NEWNET));
    }

    #[test]
    fn disabled_namespace_drops_its_flag() {
        let set = NamespaceSet {
            network: false,
            ..NamespaceSet::default()
        };
        let flags = set.to_clone_flags();
        assert!(!flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
    }
}
