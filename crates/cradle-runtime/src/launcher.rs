//! Parent-side launch orchestration.
//!
//! Spawns the re-executed child directly into its namespaces, then
//! performs the host-side setup (bridge and veth wiring, cgroup
//! attachment) while the child blocks on the sync gate. Only once both
//! are done is the gate released and the child allowed to pivot and
//! exec.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStringExt;

use nix::errno::Errno;
use nix::sched::clone;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;

use cradle_common::constants::{
    APP_NAME, CHILD_SUBCOMMAND, ENV_PEER_IFACE, ENV_REEXEC_MARKER, SYNC_GATE_FD,
};
use cradle_common::error::{CradleError, Result};
use cradle_common::types::{ContainerId, LaunchSpec};
use cradle_core::cgroup::CgroupManager;
use cradle_core::namespace::NamespaceSet;
use cradle_core::network::{self, VethPairNames};
use cradle_core::sync::SyncGate;

use crate::stage::{self, Stage};

const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Launches a container and waits for it to exit.
///
/// Returns the container command's exit code (128 + signal number if the
/// command died to a signal). The cgroup is released on every exit path
/// once the child is no longer running, and a failed launch never leaves
/// an orphaned child process behind.
///
/// # Errors
///
/// Returns a usage error for an incomplete spec, and a setup error if
/// any fatal stage (gate, cgroup, spawn, attach) fails. Host network
/// failure degrades the launch instead of aborting it.
pub fn launch(spec: &LaunchSpec) -> Result<i32> {
    spec.validate()?;

    let mut gate = SyncGate::new()?;
    let id = ContainerId::generate();
    let names = VethPairNames::from_pid(std::process::id());
    tracing::info!(
        id = %id,
        rootfs = %spec.rootfs.display(),
        command = %spec.command,
        "launching container"
    );

    let cgroup = CgroupManager::create(&format!("{APP_NAME}-{id}"), spec.memory_limit_mb)?;

    let child = match spawn_child(spec, &gate, &names) {
        Ok(pid) => pid,
        Err(e) => {
            release_cgroup(&cgroup);
            return Err(e);
        }
    };
    gate.close_read();

    let status = supervise(child, &cgroup, &mut gate, &names);
    gate.close_all();
    release_cgroup(&cgroup);
    status
}

/// Host-side setup around a running child, then the wait for its exit.
fn supervise(
    child: Pid,
    cgroup: &CgroupManager,
    gate: &mut SyncGate,
    names: &VethPairNames,
) -> Result<i32> {
    let child_pid = child.as_raw().unsigned_abs();

    let _net = stage::apply(Stage::HostNetwork, network::setup_host(child_pid, names))?;

    if let Err(e) = stage::apply(Stage::AttachCgroup, cgroup.attach(child_pid)) {
        kill_and_reap(child);
        return Err(e);
    }

    gate.signal_ready();
    forward_interrupts(child);
    wait_for_exit(child)
}

/// Spawns the re-executed child under its new namespaces.
///
/// The child callback runs on a fresh stack inside the cloned process:
/// it pins the gate's read end to the agreed descriptor index and
/// replaces itself with `/proc/self/exe <internal-subcommand> ...`.
fn spawn_child(spec: &LaunchSpec, gate: &SyncGate, names: &VethPairNames) -> Result<Pid> {
    let gate_fd = gate.read_fd().ok_or(CradleError::Sys {
        op: "sync gate read end",
        source: Errno::EBADF,
    })?;
    let exe = new_cstring("/proc/self/exe")?;
    let argv = build_child_argv(spec)?;
    let envp = build_child_env(&names.peer)?;

    let flags = NamespaceSet::default().to_clone_flags();
    let mut stack = vec![0u8; CHILD_STACK_SIZE];
    let cb = Box::new(move || child_trampoline(gate_fd, &exe, &argv, &envp));

    // SAFETY: the callback only duplicates a descriptor and execs; it
    // does not touch parent state that fork could leave inconsistent.
    let pid = unsafe { clone(cb, &mut stack, flags, Some(Signal::SIGCHLD as i32)) }.map_err(
        |e| CradleError::Sys {
            op: "clone",
            source: e,
        },
    )?;

    tracing::info!(pid = pid.as_raw(), "container process spawned");
    Ok(pid)
}

/// Runs inside the cloned child, just before the exec.
///
/// Pins the gate's read end at the agreed index with close-on-exec
/// cleared; every other inherited gate descriptor closes at exec.
fn child_trampoline(gate_fd: RawFd, exe: &CStr, argv: &[CString], envp: &[CString]) -> isize {
    if gate_fd == SYNC_GATE_FD {
        // Already at the right index; dup2 would be a no-op that leaves
        // close-on-exec set, so clear the flag directly.
        // SAFETY: plain fcntl flag manipulation on an inherited descriptor.
        let flags = unsafe { libc::fcntl(gate_fd, libc::F_GETFD) };
        if flags < 0 || unsafe { libc::fcntl(gate_fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) } < 0
        {
            return 127;
        }
    } else {
        // SAFETY: plain descriptor duplication onto a known-free index.
        if unsafe { libc::dup2(gate_fd, SYNC_GATE_FD) } < 0 {
            return 127;
        }
    }
    match nix::unistd::execve(exe, argv, envp) {
        Ok(never) => match never {},
        Err(_) => 127,
    }
}

/// Argument vector for the re-executed child.
fn build_child_argv(spec: &LaunchSpec) -> Result<Vec<CString>> {
    let mut argv = vec![
        new_cstring("/proc/self/exe")?,
        new_cstring(CHILD_SUBCOMMAND)?,
        CString::new(spec.rootfs.clone().into_os_string().into_vec()).map_err(|_| {
            CradleError::Usage {
                message: "rootfs path contains an interior NUL byte".into(),
            }
        })?,
        new_cstring(&spec.command)?,
    ];
    for arg in &spec.args {
        argv.push(new_cstring(arg)?);
    }
    Ok(argv)
}

/// Environment for the re-executed child: the parent's environment with
/// the internal marker and peer interface name overriding any inherited
/// values of the same names.
fn build_child_env(peer_name: &str) -> Result<Vec<CString>> {
    let mut envp = Vec::new();
    for (key, value) in std::env::vars_os() {
        if key == ENV_REEXEC_MARKER || key == ENV_PEER_IFACE {
            continue;
        }
        let mut entry = key.into_vec();
        entry.push(b'=');
        entry.extend(value.into_vec());
        envp.push(CString::new(entry).map_err(|_| CradleError::Usage {
            message: "environment contains an interior NUL byte".into(),
        })?);
    }
    envp.push(new_cstring(&format!("{ENV_REEXEC_MARKER}=1"))?);
    envp.push(new_cstring(&format!("{ENV_PEER_IFACE}={peer_name}"))?);
    Ok(envp)
}

fn new_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| CradleError::Usage {
        message: format!("argument contains an interior NUL byte: {s:?}"),
    })
}

/// Kills a child that could not be confined and reaps it, so a failed
/// launch leaves no orphan behind.
fn kill_and_reap(child: Pid) {
    if let Err(e) = kill(child, Signal::SIGKILL) {
        tracing::warn!(pid = child.as_raw(), error = %e, "could not kill unconfined child");
    }
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(..) | WaitStatus::Signaled(..)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

/// Forwards Ctrl-C to the child so the container shuts down first.
fn forward_interrupts(child: Pid) {
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = kill(child, Signal::SIGTERM);
    }) {
        tracing::warn!(error = %e, "interrupt forwarding not installed");
    }
}

/// Releases the cgroup, logging but not propagating any failure so the
/// launch's own exit status is preserved on every cleanup path.
fn release_cgroup(cgroup: &CgroupManager) {
    if let Err(e) = cgroup.release() {
        tracing::warn!(error = %e, "could not release cgroup");
    }
}

/// Blocks until the child terminates and maps its status to an exit
/// code.
fn wait_for_exit(child: Pid) -> Result<i32> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                tracing::info!(pid = child.as_raw(), code, "container exited");
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                tracing::warn!(pid = child.as_raw(), signal = %signal, "container killed by signal");
                return Ok(128 + signal as i32);
            }
            Ok(status) => {
                tracing::debug!(pid = child.as_raw(), ?status, "container state change");
            }
            Err(Errno::EINTR) => {}
            Err(e) => {
                return Err(CradleError::Sys {
                    op: "waitpid",
                    source: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_rejects_incomplete_spec_before_any_mutation() {
        let spec = LaunchSpec::new("/tmp/rootfs", "");
        assert!(matches!(
            launch(&spec),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn child_argv_reexecs_the_internal_subcommand() {
        let mut spec = LaunchSpec::new("/srv/rootfs", "/bin/echo");
        spec.args = vec!["hello".into(), "world".into()];

        let argv = build_child_argv(&spec).unwrap();
        let rendered: Vec<&str> = argv.iter().map(|c| c.to_str().unwrap()).collect();
        assert_eq!(
            rendered,
            vec![
                "/proc/self/exe",
                CHILD_SUBCOMMAND,
                "/srv/rootfs",
                "/bin/echo",
                "hello",
                "world"
            ]
        );
    }

    #[test]
    fn child_argv_rejects_interior_nul() {
        let spec = LaunchSpec::new("/srv/rootfs", "/bin/e\0cho");
        assert!(matches!(
            build_child_argv(&spec),
            Err(CradleError::Usage { .. })
        ));
    }

    #[test]
    fn child_env_carries_marker_and_peer_name() {
        let envp = build_child_env("cveth42").unwrap();
        let entries: Vec<&str> = envp.iter().map(|c| c.to_str().unwrap()).collect();

        assert!(entries.contains(&"CRADLE_INTERNAL_REEXEC=1"));
        assert!(entries.contains(&"CRADLE_PEER_IFACE=cveth42"));

        // The overrides appear exactly once even if the names leak into
        // the parent's environment.
        let markers = entries
            .iter()
            .filter(|e| e.starts_with("CRADLE_INTERNAL_REEXEC="))
            .count();
        assert_eq!(markers, 1);
    }
}
