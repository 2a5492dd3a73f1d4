//! Virtual network fabric: host bridge, per-launch veth pair, and the
//! container's side of the wiring.
//!
//! All operations speak rtnetlink. The lifecycle itself is synchronous,
//! so a throwaway current-thread tokio runtime drives the netlink
//! connection for the duration of each setup call.

pub mod container;
pub mod host;

use futures::TryStreamExt;
use netlink_packet_route::LinkMessage;
use rtnetlink::Handle;

use cradle_common::error::{CradleError, Result};

/// Interface names for one launch's veth pair.
///
/// Derived from the parent process ID, so simultaneous launches from
/// different processes cannot collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VethPairNames {
    /// Host-side end, attached to the bridge.
    pub host: String,
    /// Peer end, relocated into the container's network namespace.
    pub peer: String,
}

impl VethPairNames {
    /// Derives the pair for the given parent process ID.
    #[must_use]
    pub fn from_pid(pid: u32) -> Self {
        let host = format!("veth{pid}");
        let peer = format!("c{host}");
        Self { host, peer }
    }
}

/// Runs the host-side wiring for a freshly spawned container process.
///
/// # Errors
///
/// Returns an error if the bridge, veth pair, or namespace relocation
/// fails; the orchestrator treats this stage as tolerable.
pub fn setup_host(child_pid: u32, names: &VethPairNames) -> Result<()> {
    let names = names.clone();
    with_netlink(move |handle| async move { host::configure(&handle, child_pid, &names).await })
}

/// Configures the container's side of the wiring, from inside its
/// network namespace.
///
/// # Errors
///
/// Returns an error if the loopback, peer interface, address, or default
/// route cannot be configured.
pub fn setup_container(peer_name: &str) -> Result<()> {
    let peer = peer_name.to_owned();
    with_netlink(move |handle| async move { container::configure(&handle, &peer).await })
}

/// Drives a netlink task to completion on a current-thread runtime.
fn with_netlink<F, Fut>(task: F) -> Result<()>
where
    F: FnOnce(Handle) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .map_err(|e| CradleError::Network {
            message: format!("tokio runtime: {e}"),
        })?;

    runtime.block_on(async {
        let (connection, handle, _) = rtnetlink::new_connection().map_err(|e| {
            CradleError::Network {
                message: format!("netlink connection: {e}"),
            }
        })?;
        let driver = tokio::spawn(connection);
        let result = task(handle).await;
        driver.abort();
        result
    })
}

/// Fetches a link by name, treating every lookup failure as absence.
pub(crate) async fn get_link(handle: &Handle, name: &str) -> Option<LinkMessage> {
    handle
        .link()
        .get()
        .match_name(name.to_owned())
        .execute()
        .try_next()
        .await
        .ok()
        .flatten()
}

/// Resolves a link name to its interface index.
pub(crate) async fn link_index(handle: &Handle, name: &str) -> Result<u32> {
    let link = get_link(handle, name).await.ok_or_else(|| CradleError::Network {
        message: format!("interface {name} not found"),
    })?;
    Ok(link.header.index)
}

/// Wraps an rtnetlink error with the operation that produced it.
pub(crate) fn net_err(op: &str, err: &rtnetlink::Error) -> CradleError {
    CradleError::Network {
        message: format!("{op}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn veth_names_follow_the_pid() {
        let names = VethPairNames::from_pid(1234);
        assert_eq!(names.host, "veth1234");
        assert_eq!(names.peer, "cveth1234");
    }

    #[test]
    fn distinct_pids_produce_disjoint_pairs() {
        let a = VethPairNames::from_pid(100);
        let b = VethPairNames::from_pid(101);
        assert_ne!(a.host, b.host);
        assert_ne!(a.peer, b.peer);
        assert_ne!(a.host, b.peer);
    }

    #[test]
    fn names_fit_the_kernel_interface_limit() {
        // IFNAMSIZ is 16 including the terminating NUL.
        let names = VethPairNames::from_pid(u32::MAX);
        assert!(names.host.len() <= 15);
        assert!(names.peer.len() <= 15);
    }
}
