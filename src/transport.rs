//! Connected UDP socket with deadline-bounded reads.

use std::net::SocketAddr;

use log::{debug, trace};
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};

use crate::error::{RconError, Result};

/// Owns one UDP socket connected to a single remote address.
///
/// `closed` flips to true when the owner shuts the connection down; reads in
/// progress give up with [`RconError::NotConnected`] instead of running into
/// their deadline.
#[derive(Debug)]
pub struct Transport {
    socket: UdpSocket,
    remote: SocketAddr,
    closed: watch::Receiver<bool>,
}

impl Transport {
    /// Resolves `host` and connects a fresh socket to the first address found.
    pub async fn open(host: &str, port: u16, closed: watch::Receiver<bool>) -> Result<Self> {
        let remote = lookup_host((host, port))
            .await
            .map_err(|source| RconError::AddressResolution {
                host: host.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| RconError::AddressResolution {
                host: host.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                ),
            })?;

        let local = if remote.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(RconError::ConnectionError)?;
        socket
            .connect(remote)
            .await
            .map_err(RconError::ConnectionError)?;

        debug!("opened udp socket to {} ({}:{})", remote, host, port);

        Ok(Transport {
            socket,
            remote,
            closed,
        })
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Sends `bytes` as one datagram.
    pub async fn write(&self, bytes: &[u8]) -> Result<()> {
        trace!("sending {} bytes to {}", bytes.len(), self.remote);
        self.socket.send(bytes).await.map_err(RconError::SendError)?;
        Ok(())
    }

    /// Waits for one datagram until `deadline`. Returns the number of bytes
    /// written into `buf`.
    pub async fn read_datagram(&self, buf: &mut [u8], deadline: Instant) -> Result<usize> {
        let mut closed = self.closed.clone();
        tokio::select! {
            received = timeout_at(deadline, self.socket.recv(buf)) => match received {
                Ok(Ok(n)) => {
                    trace!("received {} bytes from {}", n, self.remote);
                    Ok(n)
                }
                Ok(Err(e)) => Err(RconError::ReceiveError(e)),
                Err(_) => Err(RconError::Timeout),
            },
            _ = closed.wait_for(|closed| *closed) => {
                trace!("read from {} interrupted by close", self.remote);
                Err(RconError::NotConnected)
            }
        }
    }
}
