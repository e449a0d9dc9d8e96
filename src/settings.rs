//! Per-call command policy and per-client configuration.

use std::time::Duration;

/// Read timeout used when neither the client nor the call sets one.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Idle window after the last datagram before a response counts as complete.
pub const DEFAULT_READ_EXTENSION: Duration = Duration::from_millis(350);

/// Retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Linear backoff step: attempt `n` (0-based) waits `(n + 1) * BACKOFF_STEP`.
pub const BACKOFF_STEP: Duration = Duration::from_millis(150);

/// Private messages get this in front so players can tell them apart from
/// regular chat.
pub const DEFAULT_TELL_PREFIX: &str = "[^5Gambling^7]";

pub(crate) fn backoff(attempt: u32) -> Duration {
    BACKOFF_STEP * (attempt + 1)
}

/// How a single command is sent and when it counts as answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettings {
    /// Attempts after the first one.
    pub retries: u32,
    /// `None` falls back to the client's read timeout.
    pub read_timeout: Option<Duration>,
    pub read_extension: Duration,
    /// When false, silence is a valid (empty) answer.
    pub require_success: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        CommandSettings {
            retries: DEFAULT_RETRIES,
            read_timeout: None,
            read_extension: DEFAULT_READ_EXTENSION,
            require_success: false,
        }
    }
}

impl CommandSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat silence and empty replies as failures worth retrying. Makes
    /// sure there are at least two retries to spend.
    pub fn require_success(mut self) -> Self {
        self.require_success = true;
        if self.retries == 0 {
            self.retries = 2;
        }
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_read_extension(mut self, extension: Duration) -> Self {
        self.read_extension = extension;
        self
    }
}

/// Settings that live as long as the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Zero means [`DEFAULT_READ_TIMEOUT`].
    pub read_timeout: Duration,
    pub tell_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            read_timeout: DEFAULT_READ_TIMEOUT,
            tell_prefix: DEFAULT_TELL_PREFIX.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_tell_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tell_prefix = prefix.into();
        self
    }

    pub(crate) fn timeout_or_default(&self) -> Duration {
        if self.read_timeout.is_zero() {
            DEFAULT_READ_TIMEOUT
        } else {
            self.read_timeout
        }
    }
}
