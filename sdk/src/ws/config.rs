//! WebSocket configuration.
//!
//! Provides configuration options for the live channel client.

use std::time::Duration;

/// Default live channel URL.
pub const DEFAULT_WS_URL: &str = "wss://api.gavel.example/live";

/// Default capacity of the per-channel event queue.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default time allowed for the connect handshake, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Default time allowed for the leave/close handshake, in milliseconds.
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 1000;

/// WebSocket configuration.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL.
    pub url: String,

    /// Capacity of the event queue between the reader task and the consumer.
    pub event_channel_capacity: usize,

    /// Time allowed for the TCP, TLS and WebSocket handshake.
    pub connect_timeout: Duration,

    /// Time allowed for sending `leaveAuction` and the close frame.
    pub close_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            close_timeout: Duration::from_millis(DEFAULT_CLOSE_TIMEOUT_MS),
        }
    }
}

impl WsConfig {
    /// Creates a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the event queue capacity. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the close timeout.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), super::error::WsError> {
        if self.url.is_empty() {
            return Err(super::error::WsError::InvalidConfig(
                "url cannot be empty".to_string(),
            ));
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(super::error::WsError::InvalidConfig(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(super::error::WsError::InvalidConfig(
                "connect_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = WsConfig::default();
        assert_eq!(config.url, DEFAULT_WS_URL);
        assert_eq!(config.event_channel_capacity, DEFAULT_EVENT_CHANNEL_CAPACITY);
        assert_eq!(
            config.connect_timeout,
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
        );
        assert_eq!(
            config.close_timeout,
            Duration::from_millis(DEFAULT_CLOSE_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_config_builder() {
        let config = WsConfig::new("wss://example.com/live")
            .with_event_channel_capacity(0)
            .with_connect_timeout(Duration::from_millis(250))
            .with_close_timeout(Duration::from_secs(3));

        assert_eq!(config.url, "wss://example.com/live");
        assert_eq!(config.event_channel_capacity, 1);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.close_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_validate_zero_connect_timeout() {
        let config = WsConfig::new("ws://127.0.0.1:9000").with_connect_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_valid() {
        assert!(WsConfig::new("wss://example.com/live").validate().is_ok());
        assert!(WsConfig::new("ws://127.0.0.1:9000").validate().is_ok());
    }

    #[test]
    fn test_config_validate_empty_url() {
        assert!(WsConfig::new("").validate().is_err());
    }

    #[test]
    fn test_config_validate_invalid_scheme() {
        assert!(WsConfig::new("https://example.com/live").validate().is_err());
    }
}
