//! Account and catalogue types.
//!
//! Request and response bodies for the auth, profile and listing endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::amount::Amount;
use super::auction::AuctionStatus;

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates login credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// Email address.
    pub email: String,
    /// Public username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Token and user returned by login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    /// Bearer token for REST and live connections.
    pub token: String,
    /// User record as sent by the server.
    #[serde(default)]
    pub user: Value,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Spendable balance.
    #[serde(default)]
    pub balance: Amount,
    /// Auctions this user won.
    #[serde(default)]
    pub won_auctions: Vec<AuctionSummary>,
}

/// One row of the auction list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSummary {
    /// Auction id.
    #[serde(alias = "_id")]
    pub id: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Current price.
    #[serde(default)]
    pub current_price: Amount,
    /// Opening price.
    #[serde(default)]
    pub starting_price: Amount,
    /// Status.
    #[serde(default)]
    pub status: AuctionStatus,
    /// End time.
    #[serde(default)]
    pub ends_at: Option<String>,
    /// Image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl AuctionSummary {
    /// Price to display: the current price, or the opening price before any
    /// bid.
    #[must_use]
    pub fn display_price(&self) -> Amount {
        if self.current_price.is_zero() {
            self.starting_price
        } else {
            self.current_price
        }
    }
}

/// Pagination block of the list response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
}

/// One page of auctions.
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionPage {
    /// Auctions on this page.
    #[serde(default)]
    pub auctions: Vec<AuctionSummary>,
    /// Pagination info.
    #[serde(default)]
    pub pagination: Pagination,
}

impl AuctionPage {
    /// Returns true if a page after `page` exists.
    #[must_use]
    pub fn has_more(&self, page: u32) -> bool {
        page < self.pagination.total_pages
    }
}

/// Create-auction request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuction {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Opening price.
    pub starting_price: Amount,
    /// End time.
    pub ends_at: DateTime<Utc>,
}

/// Success body of a bid submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BidReceipt {
    /// Server message, if any.
    #[serde(default)]
    pub message: Option<String>,
}
