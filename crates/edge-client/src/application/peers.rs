//! Peer lookup for `UVF`.

use std::net::{IpAddr, SocketAddr};

use edge_core::parse_listing;

/// Finds `device` in an active-device listing and returns its datagram
/// endpoint.
///
/// Returns `None` if the device is not listed or its address is unusable;
/// either way the caller treats it as offline.
pub fn find_peer(listing: &str, device: &str) -> Option<SocketAddr> {
    let entry = parse_listing(listing)
        .into_iter()
        .find(|d| d.username == device)?;
    let ip: IpAddr = entry.ip.parse().ok()?;
    Some(SocketAddr::new(ip, entry.udp_port))
}
