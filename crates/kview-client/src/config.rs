//! Client configuration.

use std::time::Duration;

/// Configuration for a [`crate::StreamClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Publisher WebSocket URL.
    pub url: String,
    /// Abort the handshake after this long. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Capacity of the outbound frame channel.
    pub outbound_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5000/ws".to_string(),
            connect_timeout: None,
            outbound_capacity: 32,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given publisher URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the handshake timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the outbound channel capacity.
    #[must_use]
    pub const fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }
}
