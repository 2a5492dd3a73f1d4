//! # cradle-core
//!
//! Low-level Linux isolation primitives for the cradle runtime.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: the PID, mount, UTS, and network isolation flags for
//!   the container's spawn call, plus hostname assignment.
//! - **Cgroups v2**: memory confinement via the unified hierarchy.
//! - **Filesystem**: `pivot_root` and the pseudo-filesystem mounts the
//!   container userland expects.
//! - **Network**: host bridge, per-launch veth pair, and the container's
//!   side of the wiring, over rtnetlink.
//! - **Sync gate**: the pipe handshake ordering parent setup before the
//!   child proceeds.
//!
//! Unsafe system calls are encapsulated behind safe wrappers with
//! `// SAFETY:` documentation.

pub mod cgroup;
pub mod filesystem;
pub mod namespace;
pub mod network;
pub mod sync;
