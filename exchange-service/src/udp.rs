//! Production transport for the engine's two notification sinks, both plain
//! `std::net::UdpSocket` as SPEC_FULL.md §5 prescribes.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use engine::notify::threshold::MulticastSink;
use engine::notify::trade::UnicastSink;
use tracing::warn;

/// Publishes threshold alerts to a shared multicast group. Joins the group
/// on construction so the loopback socket can also receive its own traffic
/// during local testing.
pub struct UdpMulticastSink {
    socket: UdpSocket,
    group: SocketAddr,
}

impl UdpMulticastSink {
    pub fn bind(group: SocketAddr, interface: Ipv4Addr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        if let SocketAddr::V4(group_v4) = group {
            socket.join_multicast_v4(group_v4.ip(), &interface)?;
        }
        Ok(Self { socket, group })
    }
}

impl MulticastSink for UdpMulticastSink {
    fn publish(&self, payload: &[u8]) {
        if let Err(e) = self.socket.send_to(payload, self.group) {
            warn!(error = %e, "failed to publish threshold alert datagram");
        }
    }
}

/// Sends per-counterparty trade datagrams. A single ephemeral-port socket is
/// reused for every send; best-effort, no retry.
pub struct UdpUnicastSink {
    socket: UdpSocket,
}

impl UdpUnicastSink {
    pub fn bind() -> std::io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        Ok(Self { socket })
    }
}

impl UnicastSink for UdpUnicastSink {
    fn send_to(&self, addr: SocketAddr, payload: &[u8]) {
        if let Err(e) = self.socket.send_to(payload, addr) {
            warn!(error = %e, %addr, "failed to deliver trade notification datagram");
        }
    }
}
