use thiserror::Error;

/// Possible errors for the package.
#[derive(Error, Debug)]
pub enum RconError {
    /// Returned by the constructor if no password was given.
    #[error("rcon password cannot be empty")]
    EmptyPassword,
    /// Returned by the constructor if the port is not a valid number.
    #[error("invalid port number: {0:?}")]
    InvalidPort(String),
    /// Returned by the convenience commands when a required argument is
    /// empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Returned if the host name could not be resolved to any address.
    #[error("failed to resolve address of {host}")]
    AddressResolution {
        host: String,
        #[source]
        source: std::io::Error,
    },
    /// Returned if the local socket could not be bound or connected to the
    /// resolved address.
    #[error("failed to establish udp connection")]
    ConnectionError(#[source] std::io::Error),
    /// Returned for every operation on a client that was closed.
    #[error("rcon connection is not established")]
    NotConnected,
    /// Internal error used if the socket is set up, but there was a problem
    /// writing to it.
    #[error("cannot send message to host")]
    SendError(#[source] std::io::Error),
    /// Internal error used if the socket is set up, but there was a problem
    /// reading from it.
    #[error("cannot receive response from host")]
    ReceiveError(#[source] std::io::Error),
    /// Returned if the server did not respond in time.
    #[error("timeout")]
    Timeout,
    /// Returned when a command that requires an answer got none after all
    /// retries.
    #[error("no response received for command {0:?}")]
    NoResponse(String),
    /// Returned when an unauthenticated query (`getinfo`, `getstatus`) got
    /// an empty reply.
    #[error("empty response to {0:?}")]
    EmptyResponse(String),
    /// Returned when a dvar query produced nothing usable.
    #[error("empty dvar response for {0:?}")]
    EmptyDvarResponse(String),
}

impl RconError {
    /// True if the error only means that nothing arrived before the read
    /// deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RconError::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, RconError>;
