//! Container-side network configuration, run from inside the new
//! network namespace after the parent has relocated the peer interface.

use std::net::IpAddr;

use rtnetlink::Handle;

use cradle_common::constants::{
    BRIDGE_GATEWAY, CONTAINER_ADDR, CONTAINER_IFACE, LOOPBACK_IFACE, SUBNET_PREFIX,
};
use cradle_common::error::Result;

use super::{link_index, net_err};

/// Brings up loopback, adopts the relocated peer interface as the
/// container's primary interface, and installs the default route.
///
/// # Errors
///
/// Returns an error if any configuration step fails; a half-configured
/// interface is worse than none, so the caller degrades the whole stage.
pub async fn configure(handle: &Handle, peer_name: &str) -> Result<()> {
    let lo_index = link_index(handle, LOOPBACK_IFACE).await?;
    handle
        .link()
        .set(lo_index)
        .up()
        .execute()
        .await
        .map_err(|e| net_err("bring up loopback", &e))?;

    let peer_index = link_index(handle, peer_name).await?;
    handle
        .link()
        .set(peer_index)
        .name(CONTAINER_IFACE.to_owned())
        .execute()
        .await
        .map_err(|e| net_err("rename peer interface", &e))?;
    handle
        .address()
        .add(peer_index, IpAddr::V4(CONTAINER_ADDR), SUBNET_PREFIX)
        .execute()
        .await
        .map_err(|e| net_err("assign container address", &e))?;
    handle
        .link()
        .set(peer_index)
        .up()
        .execute()
        .await
        .map_err(|e| net_err("bring up container interface", &e))?;

    handle
        .route()
        .add()
        .v4()
        .gateway(BRIDGE_GATEWAY)
        .execute()
        .await
        .map_err(|e| net_err("install default route", &e))?;

    tracing::info!(iface = CONTAINER_IFACE, "container network configured");
    Ok(())
}
