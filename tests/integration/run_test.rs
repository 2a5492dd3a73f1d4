//! Integration tests for container launch operations.
//!
//! These tests are implemented in:
//! `crates/cradle-runtime/tests/launch_test.rs`
//!
//! Covered scenarios:
//! - `launch_fails_fast_without_a_command`: usage error before any host mutation
//! - `launch_fails_fast_without_a_rootfs`: usage error before any host mutation
//! - `child_entry_refuses_direct_invocation`: internal entry point is gated
//! - `gate_release_reaches_a_waiter_across_threads`: sync gate handshake
//! - `concurrent_launches_get_disjoint_interface_names`: veth naming
//! - `cgroup_memory_limit_roundtrips_in_bytes`: memory ceiling layout
