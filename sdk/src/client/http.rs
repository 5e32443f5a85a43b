//! HTTP client implementation.
//!
//! Provides the main HTTP client for interacting with the Gavel REST API.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::auth::UnauthorizedListener;
use super::config::ClientConfig;
use super::error::ClientError;
use crate::types::{
    Amount, AuctionPage, AuctionSnapshot, AuthSession, BidReceipt, Credentials, NewAuction,
    Registration, UserProfile,
};

/// API error response format.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Bid request body.
#[derive(Debug, Serialize)]
struct BidRequest {
    amount: Amount,
}

/// HTTP client for the Gavel REST API.
#[derive(Clone)]
pub struct AuctionClient {
    config: ClientConfig,
    http: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
    listeners: Vec<Arc<dyn UnauthorizedListener>>,
}

impl fmt::Debug for AuctionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuctionClient")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AuctionClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .build()
            .map_err(ClientError::Request)?;

        let token = Arc::new(RwLock::new(config.token.clone()));

        Ok(Self {
            config,
            http,
            token,
            listeners: Vec::new(),
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ClientError> {
        Self::new(ClientConfig::default())
    }

    /// Creates a new client with the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Registers a listener notified on every `401` response.
    #[must_use]
    pub fn with_unauthorized_listener(
        mut self,
        listener: impl UnauthorizedListener + 'static,
    ) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replaces the bearer token. `None` signs the client out.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    /// Returns the current bearer token.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Makes a GET request, retrying transient failures.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let token = self.token().await;
        debug!("GET {}", url);
        self.request_with_retry(url.path(), self.config.max_retries, || {
            authorize(self.http.get(url.clone()), token.as_deref())
        })
        .await
    }

    /// Makes a POST request. Never retried.
    async fn post<B, T>(&self, url: Url, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.token().await;
        debug!("POST {}", url);
        self.request_with_retry(url.path(), 0, || {
            authorize(self.http.post(url.clone()), token.as_deref()).json(body)
        })
        .await
    }

    /// Makes a request with retry logic.
    async fn request_with_retry<T, F>(
        &self,
        path: &str,
        max_retries: u32,
        request_fn: F,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;
        let mut retry_count = 0;

        while retry_count <= max_retries {
            let response = request_fn().send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    debug!("{} {}", status.as_u16(), path);

                    if status.is_success() {
                        let body = resp
                            .text()
                            .await
                            .map_err(|e| ClientError::Deserialization(e.to_string()))?;
                        let body = if body.trim().is_empty() { "{}" } else { &body };

                        return serde_json::from_str(body)
                            .map_err(|e| ClientError::Deserialization(e.to_string()));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse().ok());

                        if retry_count < max_retries {
                            let wait_time = retry_after.unwrap_or(1);
                            tokio::time::sleep(Duration::from_secs(wait_time)).await;
                            retry_count += 1;
                            continue;
                        }

                        return Err(ClientError::RateLimited { retry_after });
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        warn!("Unauthorized response on {}, signing out", path);
                        self.notify_unauthorized();
                        return Err(ClientError::Unauthorized);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ClientError::NotFound(path.to_string()));
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ApiErrorResponse>(&body)
                        .ok()
                        .and_then(|e| e.message.or(e.error))
                        .unwrap_or(body);
                    error!("API error {} on {}: {}", status.as_u16(), path, message);

                    return Err(ClientError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }
                Err(e) => {
                    error!("Network error on {}: {}", path, e);
                    if e.is_timeout() && retry_count < max_retries {
                        retry_count += 1;
                        tokio::time::sleep(Duration::from_millis(100 * (1 << retry_count))).await;
                        last_error = Some(ClientError::from(e));
                        continue;
                    }
                    return Err(ClientError::from(e));
                }
            }
        }

        Err(last_error.unwrap_or(ClientError::Timeout))
    }

    fn notify_unauthorized(&self) {
        for listener in &self.listeners {
            listener.on_unauthorized();
        }
    }

    /// Gets one page of auctions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_auctions(&self, page: u32, limit: u32) -> Result<AuctionPage, ClientError> {
        let mut url = self.config.endpoint(&["auctions"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        self.get(url).await
    }

    /// Gets the snapshot of a single auction.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the auction is not found.
    pub async fn get_auction(&self, auction_id: &str) -> Result<AuctionSnapshot, ClientError> {
        self.get(self.config.endpoint(&["auctions", auction_id])?)
            .await
    }

    /// Creates an auction.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_auction(
        &self,
        auction: &NewAuction,
    ) -> Result<AuctionSnapshot, ClientError> {
        self.post(self.config.endpoint(&["auctions"])?, auction)
            .await
    }

    /// Places a bid.
    ///
    /// A rejection comes back as `ClientError::Api` carrying the server's
    /// message; it is not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the bid.
    pub async fn place_bid(
        &self,
        auction_id: &str,
        amount: Amount,
    ) -> Result<BidReceipt, ClientError> {
        let url = self.config.endpoint(&["auctions", auction_id, "bid"])?;
        self.post(url, &BidRequest { amount }).await
    }

    /// Signs in and stores the returned token on this client.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ClientError> {
        let session: AuthSession = self
            .post(self.config.endpoint(&["auth", "login"])?, credentials)
            .await?;
        self.set_token(Some(session.token.clone())).await;
        Ok(session)
    }

    /// Registers a new account and stores the returned token on this client.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession, ClientError> {
        let session: AuthSession = self
            .post(self.config.endpoint(&["auth", "register"])?, registration)
            .await?;
        self.set_token(Some(session.token.clone())).await;
        Ok(session)
    }

    /// Gets the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_profile(&self) -> Result<UserProfile, ClientError> {
        self.get(self.config.endpoint(&["user", "profile"])?)
            .await
    }
}

fn authorize(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}
