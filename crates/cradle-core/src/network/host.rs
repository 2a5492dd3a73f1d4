//! Host-side network wiring: bridge, veth pair, and relocation of the
//! peer end into the container's namespace.

use std::net::IpAddr;

use netlink_packet_route::LinkMessage;
use netlink_packet_route::link::nlas::{Info, InfoKind, Nla};
use rtnetlink::Handle;

use cradle_common::constants::{BRIDGE_GATEWAY, BRIDGE_NAME, SUBNET_PREFIX};
use cradle_common::error::{CradleError, Result};

use super::{VethPairNames, get_link, link_index, net_err};

/// Wires a freshly spawned container process into the host bridge.
///
/// Creates the veth pair, attaches the host end to the bridge, and moves
/// the peer end into the process's network namespace, where the
/// container side picks it up after the sync gate opens.
///
/// # Errors
///
/// Returns an error if any wiring step fails.
pub async fn configure(handle: &Handle, child_pid: u32, names: &VethPairNames) -> Result<()> {
    let bridge_index = ensure_bridge(handle).await?;

    handle
        .link()
        .add()
        .veth(names.host.clone(), names.peer.clone())
        .execute()
        .await
        .map_err(|e| net_err("create veth pair", &e))?;

    let host_index = link_index(handle, &names.host).await?;
    handle
        .link()
        .set(host_index)
        .master(bridge_index)
        .execute()
        .await
        .map_err(|e| net_err("attach veth to bridge", &e))?;
    handle
        .link()
        .set(host_index)
        .up()
        .execute()
        .await
        .map_err(|e| net_err("bring up host veth", &e))?;

    let peer_index = link_index(handle, &names.peer).await?;
    handle
        .link()
        .set(peer_index)
        .setns_by_pid(child_pid)
        .execute()
        .await
        .map_err(|e| net_err("move peer into container namespace", &e))?;

    tracing::info!(
        child_pid,
        host = %names.host,
        peer = %names.peer,
        "host network configured"
    );
    Ok(())
}

/// Finds the shared bridge by name, creating it on first use.
///
/// An existing bridge is reused and merely ensured up. An existing link
/// of a different kind under the bridge's name is a configuration
/// conflict and fails the setup.
async fn ensure_bridge(handle: &Handle) -> Result<u32> {
    if let Some(link) = get_link(handle, BRIDGE_NAME).await {
        if !is_bridge(&link) {
            return Err(CradleError::Network {
                message: format!("{BRIDGE_NAME} already exists but is not a bridge"),
            });
        }
        let index = link.header.index;
        handle
            .link()
            .set(index)
            .up()
            .execute()
            .await
            .map_err(|e| net_err("bring up existing bridge", &e))?;
        return Ok(index);
    }

    tracing::info!(bridge = BRIDGE_NAME, "bridge not found, creating");
    handle
        .link()
        .add()
        .bridge(BRIDGE_NAME.to_owned())
        .execute()
        .await
        .map_err(|e| net_err("create bridge", &e))?;

    let index = link_index(handle, BRIDGE_NAME).await?;
    handle
        .address()
        .add(index, IpAddr::V4(BRIDGE_GATEWAY), SUBNET_PREFIX)
        .execute()
        .await
        .map_err(|e| net_err("assign bridge address", &e))?;
    handle
        .link()
        .set(index)
        .up()
        .execute()
        .await
        .map_err(|e| net_err("bring up bridge", &e))?;
    Ok(index)
}

/// Whether a link message describes a bridge-kind interface.
fn is_bridge(link: &LinkMessage) -> bool {
    link.nlas.iter().any(|nla| match nla {
        Nla::Info(infos) => infos
            .iter()
            .any(|info| matches!(info, Info::Kind(InfoKind::Bridge))),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_kind_is_recognized() {
        let mut link = LinkMessage::default();
        link.nlas.push(Nla::Info(vec![Info::Kind(InfoKind::Bridge)]));
        assert!(is_bridge(&link));
    }

    #[test]
    fn other_kinds_are_rejected() {
        let mut link = LinkMessage::default();
        link.nlas.push(Nla::Info(vec![Info::Kind(InfoKind::Veth)]));
        assert!(!is_bridge(&link));

        let plain = LinkMessage::default();
        assert!(!is_bridge(&plain));
    }
}
