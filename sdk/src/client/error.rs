//! Client error types.
//!
//! Provides error types for HTTP client operations.

use std::fmt;

/// Client errors.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request failed.
    Request(reqwest::Error),

    /// Failed to deserialize response.
    Deserialization(String),

    /// API returned an error response.
    Api {
        /// HTTP status code.
        status: u16,
        /// Server message.
        message: String,
    },

    /// Rate limited (429).
    RateLimited {
        /// Retry after seconds.
        retry_after: Option<u64>,
    },

    /// Resource not found (404).
    NotFound(String),

    /// Unauthorized (401).
    Unauthorized,

    /// Invalid configuration.
    InvalidConfig(String),

    /// Request timeout.
    Timeout,
}

impl ClientError {
    /// Returns true for failures a user can sensibly retry (network, timeout,
    /// rate limit, server-side 5xx).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Timeout | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the server's message for API errors.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "HTTP request failed: {}", e),
            Self::Deserialization(msg) => write!(f, "deserialization failed: {}", msg),
            Self::Api { status, message } => write!(f, "API error [{}]: {}", status, message),
            Self::RateLimited { retry_after } => {
                if let Some(secs) = retry_after {
                    write!(f, "rate limited, retry after {} seconds", secs)
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::NotFound(resource) => write!(f, "not found: {}", resource),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Timeout => write!(f, "request timeout"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Api {
            status: 400,
            message: "bid must exceed current price".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error [400]: bid must exceed current price"
        );
    }

    #[test]
    fn test_client_error_rate_limited() {
        let err = ClientError::RateLimited {
            retry_after: Some(30),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = ClientError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_client_error_not_found() {
        let err = ClientError::NotFound("/auctions/a1".to_string());
        assert_eq!(err.to_string(), "not found: /auctions/a1");
    }

    #[test]
    fn test_client_error_unauthorized() {
        let err = ClientError::Unauthorized;
        assert_eq!(err.to_string(), "unauthorized");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_client_error_retryable() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!ClientError::Api {
            status: 400,
            message: "too low".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_client_error_server_message() {
        let err = ClientError::Api {
            status: 400,
            message: "too low".to_string(),
        };
        assert_eq!(err.server_message(), Some("too low"));
        assert_eq!(ClientError::Timeout.server_message(), None);
    }
}
