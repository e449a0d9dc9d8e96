//! Turns a burst of datagrams into one logical response.
//!
//! The protocol has no end-of-message marker, so a response is considered
//! complete once the socket stays quiet for `read_extension` after the last
//! datagram. Nothing at all before `read_timeout` is a [`RconError::Timeout`].

use std::time::Duration;

use log::trace;
use tokio::time::Instant;

use crate::error::Result;
use crate::packet;
use crate::settings::DEFAULT_READ_TIMEOUT;
use crate::transport::Transport;

/// Large enough for any single datagram these servers send.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Reads datagrams until the idle window closes and returns the normalized,
/// non-empty lines. A zero `read_extension` keeps the initial deadline, so
/// collection runs for the full `read_timeout`.
pub async fn read_response(
    transport: &Transport,
    read_timeout: Duration,
    read_extension: Duration,
) -> Result<Vec<String>> {
    let read_timeout = if read_timeout.is_zero() {
        DEFAULT_READ_TIMEOUT
    } else {
        read_timeout
    };

    let mut accumulated = Vec::<u8>::new();
    let mut scratch = [0u8; READ_BUFFER_SIZE];
    let mut deadline = Instant::now() + read_timeout;
    let mut datagrams = 0usize;

    loop {
        match transport.read_datagram(&mut scratch, deadline).await {
            Ok(n) => {
                if n > 0 {
                    accumulated.extend_from_slice(&scratch[..n]);
                    datagrams += 1;
                    if !read_extension.is_zero() {
                        deadline = Instant::now() + read_extension;
                    }
                }
            }
            Err(e) if e.is_timeout() => {
                if accumulated.is_empty() {
                    return Err(e);
                }
                break;
            }
            Err(e) => return Err(e),
        }
    }

    trace!(
        "collected {} bytes in {} datagrams",
        accumulated.len(),
        datagrams
    );

    let text = packet::normalize(&accumulated);
    Ok(packet::split_lines(&text))
}
