//! WebSocket error types.
//!
//! Provides error types for live channel operations.

use std::fmt;

/// WebSocket errors.
#[derive(Debug)]
pub enum WsError {
    /// Connection failed.
    Connection(String),

    /// WebSocket protocol error.
    Protocol(String),

    /// Failed to serialize message.
    Serialization(String),

    /// Failed to deserialize message.
    Deserialization(String),

    /// Credential cannot be sent as a header.
    InvalidCredential(String),

    /// Invalid configuration.
    InvalidConfig(String),

    /// Send failed.
    SendFailed(String),
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection failed: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Serialization(msg) => write!(f, "serialization failed: {}", msg),
            Self::Deserialization(msg) => write!(f, "deserialization failed: {}", msg),
            Self::InvalidCredential(msg) => write!(f, "invalid credential: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::SendFailed(msg) => write!(f, "send failed: {}", msg),
        }
    }
}

impl std::error::Error for WsError {}

impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
