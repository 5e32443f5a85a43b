//! Watcher configuration.
//!
//! Loaded from `GAVEL_*` environment variables by the binary; builder
//! methods cover everything else.

use std::time::Duration;

use gavel_sdk::client::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use gavel_sdk::types::DEFAULT_HISTORY_LIMIT;
use gavel_sdk::ws::config::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_WS_URL};
use gavel_sdk::{ClientConfig, WsConfig};
use serde::{Deserialize, Serialize};

/// REST base URL variable.
pub const ENV_API_URL: &str = "GAVEL_API_URL";
/// Live channel URL variable.
pub const ENV_WS_URL: &str = "GAVEL_WS_URL";
/// Auction to watch.
pub const ENV_AUCTION_ID: &str = "GAVEL_AUCTION_ID";
/// Bearer token.
pub const ENV_TOKEN: &str = "GAVEL_TOKEN";
/// One bid to place after the auction loads.
pub const ENV_BID: &str = "GAVEL_BID";
/// Number of recent bids to log.
pub const ENV_HISTORY_LIMIT: &str = "GAVEL_HISTORY_LIMIT";
/// Live handshake timeout in milliseconds.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "GAVEL_CONNECT_TIMEOUT_MS";

/// Configuration for the watcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchConfig {
    /// REST base URL.
    pub api_url: String,

    /// Live channel URL.
    pub ws_url: String,

    /// Auction to watch.
    pub auction_id: String,

    /// Bearer token for REST and the live channel.
    pub token: Option<String>,

    /// Bid to place once, as typed by a user.
    pub bid: Option<String>,

    /// Number of recent bids to log.
    pub history_limit: usize,

    /// REST request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Live channel handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            auction_id: String::new(),
            token: None,
            bid: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout_ms: DEFAULT_TIMEOUT_SECS * 1000,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl WatchConfig {
    /// Creates a configuration for one auction.
    #[must_use]
    pub fn for_auction(auction_id: impl Into<String>) -> Self {
        Self {
            auction_id: auction_id.into(),
            ..Default::default()
        }
    }

    /// Sets the REST base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the live channel URL.
    #[must_use]
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the bid to place once loaded.
    #[must_use]
    pub fn with_bid(mut self, bid: impl Into<String>) -> Self {
        self.bid = Some(bid.into());
        self
    }

    /// Sets the history limit.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sets the live handshake timeout.
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unreadable value or the
    /// result fails [`WatchConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; unset or blank variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Same as [`WatchConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(url) = read(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(url) = read(ENV_WS_URL) {
            config.ws_url = url;
        }
        if let Some(id) = read(ENV_AUCTION_ID) {
            config.auction_id = id;
        }
        config.token = read(ENV_TOKEN);
        config.bid = read(ENV_BID);
        if let Some(raw) = read(ENV_HISTORY_LIMIT) {
            config.history_limit = raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_HISTORY_LIMIT,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = read(ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout_ms = raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_CONNECT_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auction_id.trim().is_empty() {
            return Err(ConfigError::MissingAuctionId);
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.api_url.clone()));
        }

        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(self.ws_url.clone()));
        }

        if self.history_limit == 0 {
            return Err(ConfigError::InvalidHistoryLimit);
        }

        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    /// Builds the REST client configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.api_url.clone())
            .with_timeout(Duration::from_millis(self.request_timeout_ms));
        match &self.token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }

    /// Builds the live channel configuration.
    #[must_use]
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::new(self.ws_url.clone())
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No auction id.
    #[error("auction id is required (set GAVEL_AUCTION_ID)")]
    MissingAuctionId,

    /// URL with the wrong scheme.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Unparseable number.
    #[error("{var} must be a valid number, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Zero history limit.
    #[error("history_limit must be > 0")]
    InvalidHistoryLimit,

    /// Zero timeout.
    #[error("request_timeout_ms and connect_timeout_ms must be > 0")]
    InvalidTimeout,
}
