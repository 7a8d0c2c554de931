//! The mavconn side of the bridge: a datagram link carrying message
//! containers, plus the wire model and inbound dispatch.

pub mod dispatch;
pub mod msg;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::*;

use crate::mavconn::msg::{pack, unpack, Container, OutboundMessage};

/// Default LCM-style multicast group used when the URL carries no address.
const DEFAULT_UDPM_GROUP: SocketAddrV4 =
    SocketAddrV4::new(Ipv4Addr::new(239, 255, 76, 67), 7667);

/// How long one readiness wait on the socket may block before the event loop
/// re-checks for shutdown.
pub const RECV_WAIT: Duration = Duration::from_secs(1);

/// A connected datagram link to the mavconn network.
///
/// Each container travels as one datagram, so concurrent sends from
/// different tasks interleave at datagram granularity and need no extra
/// locking.
pub struct MavconnLink {
    sock: UdpSocket,
    remote: SocketAddr,
    sysid: u8,
    compid: u8,
}

impl MavconnLink {
    /// Opens the link described by `url`. Supported schemes:
    ///
    /// - `udpm://` or `udpm://group:port` — UDP multicast, LCM default group
    ///   when no address is given
    /// - `udp://host:port` — plain unicast to a fixed peer
    pub async fn open(url: &str, sysid: u8, compid: u8) -> anyhow::Result<Self> {
        if let Some(addr) = url.strip_prefix("udpm://") {
            let group = if addr.is_empty() {
                DEFAULT_UDPM_GROUP
            } else {
                addr.parse()
                    .with_context(|| format!("invalid multicast group {addr:?}"))?
            };

            let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, group.port()))
                .await
                .with_context(|| format!("failed to bind multicast port {}", group.port()))?;
            sock.join_multicast_v4(*group.ip(), Ipv4Addr::UNSPECIFIED)
                .with_context(|| format!("failed to join multicast group {}", group.ip()))?;
            sock.set_multicast_loop_v4(true)?;

            debug!("joined multicast group {group}");

            Ok(MavconnLink {
                sock,
                remote: SocketAddr::V4(group),
                sysid,
                compid,
            })
        } else if let Some(addr) = url.strip_prefix("udp://") {
            let remote: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid peer address {addr:?}"))?;

            let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
                .await
                .context("failed to bind udp socket")?;

            debug!("unicast link to {remote}");

            Ok(MavconnLink {
                sock,
                remote,
                sysid,
                compid,
            })
        } else {
            anyhow::bail!("unsupported link url {url:?} (expected udpm:// or udp://)")
        }
    }

    /// Builds a link on a pre-bound socket, sending to `remote`. Used by
    /// tests to wire two ends over loopback.
    pub fn from_socket(sock: UdpSocket, remote: SocketAddr, sysid: u8, compid: u8) -> Self {
        MavconnLink {
            sock,
            remote,
            sysid,
            compid,
        }
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.sock.local_addr()?)
    }

    /// Sends one outbound message as a single container datagram. Safe to
    /// call from several tasks at once.
    pub async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        let datagram = pack(self.sysid, self.compid, message);

        self.sock
            .send_to(&datagram, self.remote)
            .await
            .context("failed to send container")?;

        trace!("sent msgid {} ({} bytes)", message.msgid(), datagram.len());

        Ok(())
    }

    /// Waits up to [`RECV_WAIT`] for an inbound container. Returns
    /// `Ok(None)` on timeout, which is the normal idle path of the event
    /// loop, not an error.
    ///
    /// A datagram that does not frame as a container is also `Ok(None)`: on
    /// a shared multicast group junk from other peers is ordinary input,
    /// so only socket errors propagate.
    pub async fn recv_timeout(&self) -> anyhow::Result<Option<Container>> {
        // large enough for any UDP payload, so a valid container is never
        // truncated into a framing failure
        let mut buf = vec![0u8; 65536];

        match tokio::time::timeout(RECV_WAIT, self.sock.recv_from(&mut buf)).await {
            Err(_elapsed) => Ok(None),
            Ok(res) => {
                let (n, from) = res.context("failed to receive from link socket")?;
                trace!("read {n} bytes from {from}");

                match unpack(Bytes::copy_from_slice(&buf[..n])) {
                    Ok(container) => Ok(Some(container)),
                    Err(err) => {
                        warn!(
                            "dropping unparseable datagram from {} ({:?}): {:02x?}",
                            from,
                            err,
                            &buf[..n.min(32)]
                        );
                        Ok(None)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mavconn::msg::MSG_ID_ATTITUDE;

    async fn loopback() -> (MavconnLink, tokio::net::UdpSocket) {
        let peer = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sock = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let remote = peer.local_addr().unwrap();
        (MavconnLink::from_socket(sock, remote, 42, 199), peer)
    }

    #[tokio::test]
    async fn large_datagram_is_not_truncated() {
        let (link, peer) = loopback().await;
        let link_addr = link.local_addr().unwrap();

        let payload = vec![0xabu8; 4000];
        let datagram = Container {
            sysid: 1,
            compid: 1,
            msgid: MSG_ID_ATTITUDE,
            payload: bytes::Bytes::from(payload.clone()),
        }
        .encode();
        peer.send_to(&datagram, link_addr).await.unwrap();

        let container = link
            .recv_timeout()
            .await
            .unwrap()
            .expect("datagram pending");
        assert_eq!(container.msgid, MSG_ID_ATTITUDE);
        assert_eq!(container.payload.len(), 4000);
        assert_eq!(&container.payload[..], &payload[..]);
    }

    #[tokio::test]
    async fn unparseable_datagram_is_dropped_not_fatal() {
        let (link, peer) = loopback().await;
        let link_addr = link.local_addr().unwrap();

        peer.send_to(&[0x01, 0x02], link_addr).await.unwrap();

        // the junk datagram is consumed and reported as "nothing pending"
        let recv = link.recv_timeout().await.unwrap();
        assert!(recv.is_none());
    }
}
