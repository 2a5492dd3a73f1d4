//! System-wide constants and fixed names for the cradle runtime.

use std::net::Ipv4Addr;

/// Application name used in cgroup paths and diagnostics.
pub const APP_NAME: &str = "cradle";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "crdl";

/// Name of the internal re-exec subcommand.
pub const CHILD_SUBCOMMAND: &str = "internal-child";

/// Marker environment variable proving the child was re-executed by the
/// runtime itself rather than invoked directly.
pub const ENV_REEXEC_MARKER: &str = "CRADLE_INTERNAL_REEXEC";

/// Environment variable carrying the generated peer interface name from
/// the parent to the child.
pub const ENV_PEER_IFACE: &str = "CRADLE_PEER_IFACE";

/// Descriptor index at which the child inherits the sync gate's read end,
/// just past the three standard streams.
pub const SYNC_GATE_FD: i32 = 3;

/// Hostname set inside the container's UTS namespace.
pub const CONTAINER_HOSTNAME: &str = "cradle";

/// Staging directory inside the rootfs where the old root is parked
/// during the pivot.
pub const OLD_ROOT_DIR: &str = "old_root";

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Parent directory grouping all cradle cgroups under the hierarchy root.
pub const CGROUP_PARENT: &str = "cradle";

/// Default memory ceiling applied to a container, in megabytes.
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 100;

/// Name of the shared host bridge.
pub const BRIDGE_NAME: &str = "cradle0";

/// Gateway address assigned to the bridge on the host side.
pub const BRIDGE_GATEWAY: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// Address assigned to the container's primary interface.
pub const CONTAINER_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

/// Prefix length of the bridge subnet, shared by both addresses.
pub const SUBNET_PREFIX: u8 = 24;

/// Conventional name of the container's primary interface.
pub const CONTAINER_IFACE: &str = "eth0";

/// Name of the loopback interface.
pub const LOOPBACK_IFACE: &str = "lo";

/// Nameservers written into the container's `/etc/resolv.conf`.
pub const DNS_NAMESERVERS: &[&str] = &["8.8.8.8", "1.1.1.1"];
