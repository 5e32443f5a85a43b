//! Bid input validation.
//!
//! Checks run locally before anything is sent. Passing them does not mean
//! the bid is accepted: the server has the final word and a confirmed bid
//! only reaches the view through the live channel.

use crate::client::ClientError;
use crate::types::{Amount, AuctionStatus, AuctionView};

/// Why a bid was not placed.
#[derive(Debug, thiserror::Error)]
pub enum BidError {
    /// Input is not a positive number.
    #[error("enter a valid amount: {0:?}")]
    InvalidAmount(String),

    /// Input does not beat the current bid.
    #[error("bid must be higher than {current}")]
    TooLow {
        /// Current highest bid.
        current: Amount,
    },

    /// Auction no longer accepts bids.
    #[error("auction is {0}")]
    Closed(AuctionStatus),

    /// Server refused the bid.
    #[error("bid rejected: {0}")]
    Rejected(String),

    /// Session is not signed in or the token expired.
    #[error("not authorized to bid")]
    Unauthorized,

    /// Transport failure.
    #[error("failed to place bid: {0}")]
    Client(#[source] ClientError),
}

impl BidError {
    /// Returns true if the failure happened before any request was sent.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::TooLow { .. } | Self::Closed(_)
        )
    }
}

impl From<ClientError> for BidError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => Self::Unauthorized,
            ClientError::Api { message, .. } if !message.is_empty() => Self::Rejected(message),
            other => Self::Client(other),
        }
    }
}

/// Local checks on user-entered bids.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidGuard;

impl BidGuard {
    /// Validates a bid typed by the user against the highest confirmed bid.
    ///
    /// With no current bid known only the number itself is checked.
    ///
    /// # Errors
    ///
    /// Returns `BidError::InvalidAmount` for non-numeric, zero, or negative
    /// input and `BidError::TooLow` if the amount does not exceed
    /// `current_bid`.
    pub fn validate(input: &str, current_bid: Option<Amount>) -> Result<Amount, BidError> {
        let amount =
            Amount::parse(input).map_err(|_| BidError::InvalidAmount(input.to_string()))?;
        if amount.is_zero() {
            return Err(BidError::InvalidAmount(input.to_string()));
        }

        match current_bid {
            Some(current) if amount <= current => Err(BidError::TooLow { current }),
            _ => Ok(amount),
        }
    }

    /// Validates a bid against a loaded view, refusing closed auctions.
    ///
    /// # Errors
    ///
    /// Returns `BidError::Closed` if the view is in a terminal state, and
    /// otherwise whatever [`BidGuard::validate`] returns.
    pub fn validate_for(input: &str, view: Option<&AuctionView>) -> Result<Amount, BidError> {
        if let Some(view) = view.filter(|v| !v.is_open()) {
            return Err(BidError::Closed(view.status()));
        }
        Self::validate(input, view.map(AuctionView::current_bid))
    }
}
