//! REST client configuration.
//!
//! Holds where the auction API lives, how long to wait for it, and the
//! bearer token a client starts with. Endpoint URLs are built from path
//! segments so auction ids are always percent-encoded.

use std::time::Duration;

use reqwest::Url;

use super::error::ClientError;

/// Default base URL for the auction API.
pub const DEFAULT_BASE_URL: &str = "https://api.gavel.example";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default retries for reads. Writes such as bids are never retried.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// REST client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; may carry a path prefix such as `/api`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Retries for reads on timeout or `429`.
    pub max_retries: u32,

    /// Token the client is signed in with at start, if any.
    pub token: Option<String>,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            token: None,
            user_agent: format!("gavel-sdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the read retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Starts the client signed in with `token`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the URL for an endpoint from its path segments.
    ///
    /// Each segment is percent-encoded, so an auction id containing `/`,
    /// `?` or `#` stays one segment.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the base URL cannot carry a
    /// path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.parsed_base_url()?;
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::InvalidConfig(format!("base_url cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute `http`/`https`
    /// URL, or the token is blank.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.parsed_base_url()?;

        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ClientError::InvalidConfig(
                "token cannot be blank".to_string(),
            ));
        }

        Ok(())
    }

    fn parsed_base_url(&self) -> Result<Url, ClientError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base_url {:?}: {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidConfig(format!(
                "base_url must use http or https, got {}",
                other
            ))),
        }
    }
}
