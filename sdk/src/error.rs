//! SDK error types.
//!
//! Provides error types for domain-level SDK operations.

/// SDK errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    /// Invalid amount value.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid auction status string.
    #[error("invalid auction status: {0}")]
    InvalidStatus(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
