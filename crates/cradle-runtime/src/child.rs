//! Container-side entry point, reached only through re-execution.
//!
//! Validates that the runtime itself invoked it, waits for the parent's
//! gate release, then builds the container environment and hands the
//! process over to the user command.

use std::convert::Infallible;
use std::ffi::{CString, OsStr};
use std::path::Path;

use nix::unistd::{execv, getpid};

use cradle_common::constants::{
    CHILD_SUBCOMMAND, CONTAINER_HOSTNAME, ENV_PEER_IFACE, ENV_REEXEC_MARKER, SYNC_GATE_FD,
};
use cradle_common::error::{CradleError, Result};
use cradle_core::filesystem;
use cradle_core::namespace;
use cradle_core::network;
use cradle_core::sync::GateWaiter;

use crate::stage::{self, Stage};

/// Runs the container side of a launch.
///
/// On success the process image is replaced by the user command and this
/// function never returns; the `Ok` variant cannot be constructed. Any
/// failing step is fatal; there is no partial-success state.
///
/// # Errors
///
/// Returns a usage error when invoked outside the runtime's own
/// re-execution, and a setup error if the gate, hostname, filesystem
/// pivot, or exec fails.
pub fn run(rootfs: &Path, command: &str, args: &[String]) -> Result<Infallible> {
    ensure_internal_invocation(
        std::env::var(ENV_REEXEC_MARKER).ok().as_deref(),
        getpid().as_raw(),
    )?;

    // Block here until the parent has finished cgroup attachment and
    // network relocation; proceeding earlier would race both.
    GateWaiter::from_inherited_fd(SYNC_GATE_FD).wait()?;

    namespace::set_hostname(CONTAINER_HOSTNAME)?;

    match std::env::var(ENV_PEER_IFACE) {
        Ok(peer) => {
            let _net = stage::apply(Stage::ContainerNetwork, network::setup_container(&peer))?;
        }
        Err(_) => {
            tracing::warn!("no peer interface name in the environment, skipping network setup");
        }
    }

    filesystem::isolate(rootfs)?;

    exec_command(command, args)
}

/// Refuses the internal entry point unless it was reached through the
/// runtime's own re-execution: marker present and PID 1 inside the new
/// process namespace. Nothing is mounted before this check.
fn ensure_internal_invocation(marker: Option<&str>, pid: i32) -> Result<()> {
    if marker != Some("1") || pid != 1 {
        return Err(CradleError::Usage {
            message: format!(
                "{CHILD_SUBCOMMAND} is invoked by the runtime itself and cannot be run directly"
            ),
        });
    }
    Ok(())
}

/// Replaces the process image with the user command, forwarding the
/// current environment.
///
/// argv[0] carries the command's basename so multi-call binaries resolve
/// the right applet.
fn exec_command(command: &str, args: &[String]) -> Result<Infallible> {
    let path = new_cstring(command)?;
    let mut argv = vec![new_cstring(argv0_for(command))?];
    for arg in args {
        argv.push(new_cstring(arg)?);
    }

    tracing::debug!(command, "replacing process image");
    execv(&path, &argv).map_err(|e| CradleError::Exec {
        command: command.to_owned(),
        source: e,
    })
}

/// Basename used as the command's zeroth argument.
fn argv0_for(command: &str) -> &str {
    Path::new(command)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or(command)
}

fn new_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| CradleError::Usage {
        message: format!("argument contains an interior NUL byte: {s:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_without_the_marker() {
        assert!(matches!(
            ensure_internal_invocation(None, 1),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn refuses_outside_a_new_pid_namespace() {
        assert!(matches!(
            ensure_internal_invocation(Some("1"), 4321),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn refuses_a_wrong_marker_value() {
        assert!(matches!(
            ensure_internal_invocation(Some("yes"), 1),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn accepts_the_internal_invocation() {
        ensure_internal_invocation(Some("1"), 1).unwrap();
    }

    #[test]
    fn argv0_is_the_command_basename() {
        assert_eq!(argv0_for("/bin/echo"), "echo");
        assert_eq!(argv0_for("/usr/local/bin/busybox"), "busybox");
        assert_eq!(argv0_for("sh"), "sh");
    }

    #[test]
    fn run_refuses_direct_invocation_without_mounting() {
        // No marker in the test environment, and the test process is not
        // PID 1 either; the entry point must refuse before touching any
        // mounts.
        let result = run(Path::new("/tmp/rootfs"), "/bin/sh", &[]);
        assert!(matches!(result, Err(CradleError::Usage { .. })));
    }
}
