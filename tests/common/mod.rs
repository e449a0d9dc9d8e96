//! Scripted UDP game server for exercising the client over loopback.
//!
//! Replies are queued in order; every datagram the client sends consumes
//! the next one. Once the queue is empty the server stays silent. Every
//! received request is forwarded to the test through a channel.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use codrcon::{Client, ClientConfig};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "hunter2";

/// What the server does with one incoming request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Ignore the request.
    Silent,
    /// Send each datagram after waiting for its delay.
    Datagrams(Vec<(Duration, Vec<u8>)>),
    /// Send the request body back, framed like console output.
    Echo,
}

impl Reply {
    /// One datagram carrying `text` as console output.
    pub fn print(text: &str) -> Self {
        Reply::Datagrams(vec![(Duration::ZERO, oob_print(text))])
    }
}

/// `FF FF FF FF print\n<text>`
pub fn oob_print(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFF, 0xFF, 0xFF];
    out.extend_from_slice(b"print\n");
    out.extend_from_slice(text.as_bytes());
    out
}

pub struct MockUdpServer {
    socket: UdpSocket,
    replies: VecDeque<Reply>,
}

pub struct RunningServer {
    pub addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<Vec<u8>>,
    handle: JoinHandle<()>,
}

impl MockUdpServer {
    pub async fn new() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("bind mock udp server");
        MockUdpServer {
            socket,
            replies: VecDeque::new(),
        }
    }

    pub fn expect(&mut self, reply: Reply) -> &mut Self {
        self.replies.push_back(reply);
        self
    }

    pub fn start(self) -> RunningServer {
        let addr = self.socket.local_addr().expect("mock server address");
        let (tx, requests) = mpsc::unbounded_channel();
        let MockUdpServer {
            socket,
            mut replies,
        } = self;

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                let (n, peer) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(_) => continue,
                };
                let request = buf[..n].to_vec();
                let _ = tx.send(request.clone());

                match replies.pop_front().unwrap_or(Reply::Silent) {
                    Reply::Silent => {}
                    Reply::Datagrams(datagrams) => {
                        for (delay, datagram) in datagrams {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            let _ = socket.send_to(&datagram, peer).await;
                        }
                    }
                    Reply::Echo => {
                        let body = request
                            .strip_prefix(&[0xFF, 0xFF, 0xFF, 0xFF][..])
                            .unwrap_or(&request[..]);
                        let text = String::from_utf8_lossy(body);
                        let _ = socket.send_to(&oob_print(text.trim_end()), peer).await;
                    }
                }
            }
        });

        RunningServer {
            addr,
            requests,
            handle,
        }
    }
}

impl RunningServer {
    pub async fn client(&self) -> Client {
        self.client_with_timeout(Duration::from_millis(200)).await
    }

    pub async fn client_with_timeout(&self, timeout: Duration) -> Client {
        Client::connect_with_config(
            "127.0.0.1",
            &self.addr.port().to_string(),
            PASSWORD,
            ClientConfig::default().with_read_timeout(timeout),
        )
        .await
        .expect("connect to mock server")
    }

    /// Requests received so far, as text with the sentinel removed.
    pub fn requests(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(request) = self.requests.try_recv() {
            let body = request
                .strip_prefix(&[0xFF, 0xFF, 0xFF, 0xFF][..])
                .expect("request starts with the oob sentinel");
            out.push(String::from_utf8_lossy(body).into_owned());
        }
        out
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
