//! Integration tests for the launch pipeline's unprivileged surface.
//!
//! These tests cover everything that does not require root or a live
//! kernel namespace:
//! 1. Launch request validation (fail fast, before any host mutation)
//! 2. Internal entry-point gating (refusal without the re-exec marker)
//! 3. Sync gate handshake semantics
//! 4. Veth name derivation
//! 5. Cgroup control-file layout against a plain directory tree
//!
//! The privileged end-to-end path (pivot completeness, bridged
//! networking, memory confinement on a live cgroup hierarchy) needs root
//! and a prepared rootfs and is exercised manually.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use cradle_common::error::CradleError;
use cradle_common::types::LaunchSpec;
use cradle_core::cgroup::CgroupManager;
use cradle_core::network::VethPairNames;
use cradle_core::sync::{GateWaiter, SyncGate};

// ── Validation ───────────────────────────────────────────────────────

#[test]
fn launch_fails_fast_without_a_command() {
    let spec = LaunchSpec::new("/srv/rootfs", "");
    let err = cradle_runtime::launcher::launch(&spec).expect_err("must refuse");
    assert!(matches!(err, CradleError::Usage { .. }));
}

#[test]
fn launch_fails_fast_without_a_rootfs() {
    let spec = LaunchSpec::new("", "/bin/echo");
    let err = cradle_runtime::launcher::launch(&spec).expect_err("must refuse");
    assert!(matches!(err, CradleError::Usage { .. }));
}

// ── Internal entry point ─────────────────────────────────────────────

#[test]
fn child_entry_refuses_direct_invocation() {
    let err = cradle_runtime::child::run(Path::new("/srv/rootfs"), "/bin/sh", &[])
        .expect_err("must refuse outside re-exec");
    assert!(matches!(err, CradleError::Usage { .. }));
}

// ── Sync gate ────────────────────────────────────────────────────────

#[test]
fn gate_release_reaches_a_waiter_across_threads() {
    let mut gate = SyncGate::new().unwrap();
    let waiter = GateWaiter::from_inherited_fd(gate.read_fd().unwrap());

    let handle = std::thread::spawn(move || waiter.wait());
    gate.signal_ready();
    handle.join().unwrap().unwrap();

    // Re-signaling a released gate stays a no-op.
    gate.signal_ready();
    gate.close_all();
}

// ── Veth naming ──────────────────────────────────────────────────────

#[test]
fn concurrent_launches_get_disjoint_interface_names() {
    let first = VethPairNames::from_pid(2001);
    let second = VethPairNames::from_pid(2002);
    assert_ne!(first.host, second.host);
    assert_ne!(first.peer, second.peer);
}

// ── Cgroup layout ────────────────────────────────────────────────────

#[test]
fn cgroup_memory_limit_roundtrips_in_bytes() {
    let root = tempfile::tempdir().unwrap();
    let cgroup = CgroupManager::create_under(root.path(), "launch-test", 256).unwrap();

    let stored = std::fs::read_to_string(cgroup.path().join("memory.max")).unwrap();
    assert_eq!(stored, (256_u64 * 1024 * 1024).to_string());
}
