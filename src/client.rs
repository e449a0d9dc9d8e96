use std::time::Duration;

use log::{debug, trace, warn};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::{
    error::{RconError, Result},
    packet::Packet,
    response::read_response,
    settings::{self, ClientConfig, CommandSettings, DEFAULT_READ_EXTENSION},
    transport::Transport,
};

/// Asynchronous rcon client for Quake 3 style servers. Call `connect()` to
/// open the UDP socket. Nothing is sent until the first command, since the
/// password travels with every request.
///
/// Replies carry no request id, so every exchange holds the socket for its
/// whole duration (retries included). Share a client between tasks with an
/// `Arc`; concurrent calls simply queue up. `close()` does not queue: it
/// interrupts the exchange in flight.
///
/// ## Example
/// ```no_run
/// use codrcon::client::Client;
/// use std::error::Error;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let client = Client::connect("127.0.0.1", "28960", "<put rcon password here>").await?;
///     let status = client.status().await?;
///
///     println!("{} players on {}", status.players.len(), status.map);
///     client.close().await?;
///     Ok(())
/// }
/// ```
pub struct Client {
    host: String,
    port: u16,
    password: String,
    config: ClientConfig,
    closed: watch::Sender<bool>,
    transport: Mutex<Option<Transport>>,
}

/// What to do after one send/receive attempt.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Hand these lines to the caller.
    Done(Vec<String>),
    /// Back off and try again, remembering the error if there was one.
    Retry(Option<RconError>),
    /// Give up without spending the remaining attempts.
    Fail(RconError),
}

/// Decides the fate of one attempt. Any lines at all win, whatever the
/// policy; silence only counts as success when the command does not require
/// one, and transport errors other than a timeout are never retried.
pub(crate) fn evaluate(result: Result<Vec<String>>, require_success: bool) -> Outcome {
    match result {
        Ok(lines) if !lines.is_empty() => Outcome::Done(lines),
        Ok(lines) if !require_success => Outcome::Done(lines),
        Ok(_) => Outcome::Retry(None),
        Err(e) if e.is_timeout() && !require_success => Outcome::Done(Vec::new()),
        Err(e) if e.is_timeout() => Outcome::Retry(Some(e)),
        Err(e) => Outcome::Fail(e),
    }
}

impl Client {
    /// Validates the arguments, resolves `host` and opens the socket, using
    /// the default configuration.
    pub async fn connect(host: &str, port: &str, password: &str) -> Result<Self> {
        Self::connect_with_config(host, port, password, ClientConfig::default()).await
    }

    pub async fn connect_with_config(
        host: &str,
        port: &str,
        password: &str,
        config: ClientConfig,
    ) -> Result<Self> {
        if password.is_empty() {
            return Err(RconError::EmptyPassword);
        }
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| RconError::InvalidPort(port.to_string()))?;

        let (closed, closed_rx) = watch::channel(false);
        let transport = Transport::open(host, port, closed_rx).await?;

        trace!("client ready for {}:{}", host, port);

        Ok(Client {
            host: host.to_string(),
            port,
            password: password.to_string(),
            config,
            closed,
            transport: Mutex::new(Some(transport)),
        })
    }

    pub fn host(&self) -> &str {
        self.host.as_ref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Releases the socket. An exchange in flight stops at its current read
    /// or backoff and fails with [`RconError::NotConnected`], as does every
    /// later call, including a second `close()`.
    pub async fn close(&self) -> Result<()> {
        self.closed.send_replace(true);
        let mut guard = self.transport.lock().await;
        match guard.take() {
            Some(transport) => {
                debug!("closing udp socket to {}", transport.remote_addr());
                Ok(())
            }
            None => Err(RconError::NotConnected),
        }
    }

    /// Run an authenticated console command and return the reply lines.
    ///
    /// With the default settings a server that stays silent yields an empty
    /// vector rather than an error. With [`CommandSettings::require_success`]
    /// silence is retried with linear backoff and finally reported as the
    /// last error seen, or [`RconError::NoResponse`].
    pub async fn send_command(
        &self,
        command: &str,
        args: Option<&str>,
        settings: CommandSettings,
    ) -> Result<Vec<String>> {
        let guard = self.lock_open().await?;
        let transport = guard.as_ref().ok_or(RconError::NotConnected)?;

        let packet = Packet::rcon(&self.password, command, args).pack();
        let read_timeout = settings
            .read_timeout
            .unwrap_or_else(|| self.config.timeout_or_default());

        let mut last_error: Option<RconError> = None;
        for attempt in 0..=settings.retries {
            let is_last = attempt == settings.retries;
            trace!("sending {:?}, attempt {}", command, attempt + 1);

            if let Err(e) = transport.write(&packet).await {
                warn!("failed to send {:?}: {}", command, e);
                last_error = Some(e);
                if !is_last {
                    self.pause(settings::backoff(attempt)).await?;
                }
                continue;
            }

            let extension = settings.read_extension;
            let result = read_response(transport, read_timeout, extension).await;

            match evaluate(result, settings.require_success) {
                Outcome::Done(lines) => {
                    trace!("{:?} answered with {} lines", command, lines.len());
                    return Ok(lines);
                }
                Outcome::Fail(e) => return Err(e),
                Outcome::Retry(error) => {
                    trace!(
                        "no usable answer to {:?} on attempt {}",
                        command,
                        attempt + 1
                    );
                    if error.is_some() {
                        last_error = error;
                    }
                }
            }

            if !is_last {
                self.pause(settings::backoff(attempt)).await?;
            }
        }

        match last_error {
            Some(e) => Err(e),
            None if settings.require_success => {
                Err(RconError::NoResponse(command.trim().to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Sleeps between attempts, cut short by `close()`.
    pub(crate) async fn pause(&self, delay: Duration) -> Result<()> {
        let mut closed = self.closed.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = closed.wait_for(|closed| *closed) => Err(RconError::NotConnected),
        }
    }

    /// Takes the exchange lock, refusing early once the client is closed.
    async fn lock_open(&self) -> Result<MutexGuard<'_, Option<Transport>>> {
        let closed = *self.closed.borrow();
        if closed {
            return Err(RconError::NotConnected);
        }
        Ok(self.transport.lock().await)
    }

    /// Send an unauthenticated connectionless query (`getinfo`,
    /// `getstatus`). A single attempt; silence is an error here.
    pub(crate) async fn query(&self, query: &str) -> Result<Vec<String>> {
        let guard = self.lock_open().await?;
        let transport = guard.as_ref().ok_or(RconError::NotConnected)?;

        trace!("sending query {:?}", query);
        transport.write(&Packet::query(query).pack()).await?;

        let read_timeout = self.config.timeout_or_default();
        let lines = read_response(transport, read_timeout, DEFAULT_READ_EXTENSION).await?;
        if lines.is_empty() {
            return Err(RconError::EmptyResponse(query.to_string()));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lines_short_circuit_regardless_of_policy() {
        for require in [false, true] {
            match evaluate(Ok(lines(&["hi"])), require) {
                Outcome::Done(l) => assert_eq!(l, lines(&["hi"])),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn silence_is_success_unless_required() {
        assert!(matches!(
            evaluate(Ok(vec![]), false),
            Outcome::Done(l) if l.is_empty()
        ));
        assert!(matches!(evaluate(Ok(vec![]), true), Outcome::Retry(None)));

        assert!(matches!(
            evaluate(Err(RconError::Timeout), false),
            Outcome::Done(l) if l.is_empty()
        ));
        assert!(matches!(
            evaluate(Err(RconError::Timeout), true),
            Outcome::Retry(Some(RconError::Timeout))
        ));
    }

    #[test]
    fn io_errors_are_not_retried() {
        let err = RconError::ReceiveError(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(
            evaluate(Err(err), true),
            Outcome::Fail(RconError::ReceiveError(_))
        ));
    }
}
