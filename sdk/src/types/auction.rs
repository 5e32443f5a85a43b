//! Auction types for the Gavel SDK.
//!
//! Holds the raw snapshot shape the server sends and the normalized
//! [`AuctionView`] the screen renders from.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::amount::Amount;
use crate::error::SdkError;

/// Number of bids shown in the history list by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Display name used when a bid carries no bidder.
pub const ANONYMOUS_BIDDER: &str = "Anonymous";

static LOCAL_BID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Auction lifecycle status.
///
/// Moves one way only: `Active` to `Sold` or `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuctionStatus {
    /// Accepting bids.
    #[default]
    Active,
    /// Sold to a winner.
    Sold,
    /// Ended without a sale.
    Expired,
}

impl AuctionStatus {
    /// Returns true for `Sold` and `Expired`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sold | Self::Expired)
    }

    /// Reads a status from the wire, treating missing or unknown values as
    /// `Active`.
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Sold => write!(f, "SOLD"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl<'de> Deserialize<'de> for AuctionStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_wire(raw.as_deref()))
    }
}

impl FromStr for AuctionStatus {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "SOLD" => Ok(Self::Sold),
            "EXPIRED" => Ok(Self::Expired),
            _ => Err(SdkError::InvalidStatus(s.to_string())),
        }
    }
}

/// Bidder details nested in a snapshot bid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBidder {
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// A bid as it appears on the wire.
///
/// Live `NEW_BID` payloads use `bidderName`/`timestamp`; snapshot history
/// entries use `user`/`createdAt`. Both map onto this shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBid {
    /// Server-assigned identifier.
    #[serde(default)]
    pub id: Option<Value>,
    /// Bid amount.
    #[serde(default)]
    pub amount: Amount,
    /// Bidder display name (live events).
    #[serde(default)]
    pub bidder_name: Option<String>,
    /// Bidder details (snapshot history).
    #[serde(default)]
    pub user: Option<RawBidder>,
    /// Bid time (live events).
    #[serde(default)]
    pub timestamp: Option<Value>,
    /// Bid time (snapshot history).
    #[serde(default)]
    pub created_at: Option<Value>,
}

/// A server-confirmed bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRecord {
    /// Server id, or a locally synthesized one.
    pub id: String,
    /// True when `id` was made up on this device.
    ///
    /// Synthesized ids are for display keys only and must never be used to
    /// de-duplicate bids.
    pub synthesized: bool,
    /// Bid amount.
    pub amount: Amount,
    /// Bidder display name, if the server sent one.
    pub bidder: Option<String>,
    /// When the bid was placed.
    pub timestamp: Option<DateTime<Utc>>,
}

impl BidRecord {
    /// Creates a bid record with a synthesized id.
    #[must_use]
    pub fn new(amount: Amount, bidder: Option<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            id: synthesize_bid_id(),
            synthesized: true,
            amount,
            bidder,
            timestamp,
        }
    }

    /// Normalizes a wire bid.
    #[must_use]
    pub fn from_raw(raw: RawBid) -> Self {
        let server_id = raw.id.as_ref().and_then(value_to_id);
        let bidder = raw
            .bidder_name
            .or_else(|| {
                raw.user
                    .and_then(|u| u.username.filter(|n| !n.is_empty()).or(u.email))
            })
            .filter(|name| !name.is_empty());
        let timestamp = raw
            .timestamp
            .as_ref()
            .or(raw.created_at.as_ref())
            .and_then(parse_timestamp);

        match server_id {
            Some(id) => Self {
                id,
                synthesized: false,
                amount: raw.amount,
                bidder,
                timestamp,
            },
            None => Self::new(raw.amount, bidder, timestamp),
        }
    }

    /// Returns the bidder name to show, falling back to `Anonymous`.
    #[must_use]
    pub fn display_bidder(&self) -> &str {
        self.bidder.as_deref().unwrap_or(ANONYMOUS_BIDDER)
    }
}

impl fmt::Display for BidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.amount, self.display_bidder())
    }
}

fn synthesize_bid_id() -> String {
    let seq = LOCAL_BID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("local-{}-{}", Utc::now().timestamp_millis(), seq)
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses an RFC 3339 string or a milliseconds-since-epoch number.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.trim().parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Raw auction snapshot, from `GET /auctions/{id}` or a pushed
/// `AUCTION_STATE`.
///
/// Every field is optional; [`AuctionView::from_snapshot`] fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    /// Auction id.
    #[serde(default, alias = "_id")]
    pub id: Option<Value>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current highest price.
    #[serde(default)]
    pub current_price: Option<Value>,
    /// Opening price.
    #[serde(default)]
    pub starting_price: Option<Value>,
    /// End time.
    #[serde(default)]
    pub ends_at: Option<String>,
    /// End time rendered in IST by the server.
    #[serde(default, rename = "endsAtIST")]
    pub ends_at_ist: Option<String>,
    /// Status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Bid history, newest first.
    #[serde(default)]
    pub bids: Option<Vec<Value>>,
    /// Image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl AuctionSnapshot {
    /// Parses a snapshot from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Deserialization` if the value is not an object of
    /// the expected shape.
    pub fn from_value(value: Value) -> Result<Self, SdkError> {
        serde_json::from_value(value).map_err(|e| SdkError::Deserialization(e.to_string()))
    }

    /// Returns the auction id as a string, if present.
    #[must_use]
    pub fn auction_id(&self) -> Option<String> {
        self.id.as_ref().and_then(value_to_id)
    }

    /// Returns the first readable price among `currentPrice` and
    /// `startingPrice`, or zero.
    #[must_use]
    pub fn current_bid(&self) -> Amount {
        [self.current_price.as_ref(), self.starting_price.as_ref()]
            .into_iter()
            .flatten()
            .find_map(Amount::try_coerce)
            .unwrap_or(Amount::ZERO)
    }

    /// Returns the parsed status.
    #[must_use]
    pub fn status(&self) -> AuctionStatus {
        AuctionStatus::from_wire(self.status.as_deref())
    }

    /// Returns the advisory end time.
    #[must_use]
    pub fn end_time(&self) -> Option<String> {
        self.ends_at.clone().or_else(|| self.ends_at_ist.clone())
    }

    /// Returns the history as bid records, skipping entries that are not
    /// objects.
    #[must_use]
    pub fn bid_records(&self) -> Option<Vec<BidRecord>> {
        self.bids.as_ref().map(|bids| {
            bids.iter()
                .filter_map(|v| serde_json::from_value::<RawBid>(v.clone()).ok())
                .map(BidRecord::from_raw)
                .collect()
        })
    }
}

/// The merged, render-ready state of one auction.
///
/// Only the reconciler mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionView {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) current_bid: Amount,
    pub(crate) status: AuctionStatus,
    pub(crate) bids: Vec<BidRecord>,
    pub(crate) end_time: Option<String>,
    pub(crate) image_url: Option<String>,
}

impl AuctionView {
    /// Builds a view from a snapshot.
    ///
    /// `fallback_id` is used when the snapshot carries no id.
    #[must_use]
    pub fn from_snapshot(snapshot: &AuctionSnapshot, fallback_id: &str) -> Self {
        Self {
            id: snapshot
                .auction_id()
                .unwrap_or_else(|| fallback_id.to_string()),
            title: snapshot.title.clone().unwrap_or_default(),
            description: snapshot.description.clone().unwrap_or_default(),
            current_bid: snapshot.current_bid(),
            status: snapshot.status(),
            bids: snapshot.bid_records().unwrap_or_default(),
            end_time: snapshot.end_time(),
            image_url: snapshot.image_url.clone(),
        }
    }

    /// Auction id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Highest confirmed bid.
    #[must_use]
    pub const fn current_bid(&self) -> Amount {
        self.current_bid
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> AuctionStatus {
        self.status
    }

    /// Full bid history, newest first.
    #[must_use]
    pub fn bids(&self) -> &[BidRecord] {
        &self.bids
    }

    /// The newest `limit` bids.
    #[must_use]
    pub fn recent_bids(&self, limit: usize) -> &[BidRecord] {
        &self.bids[..self.bids.len().min(limit)]
    }

    /// Advisory end time from the last snapshot.
    #[must_use]
    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    /// Image URL.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Default value for the bid input.
    #[must_use]
    pub fn suggested_bid(&self) -> Amount {
        self.current_bid.next_bid()
    }

    /// Returns true while bids are accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse() {
        assert_eq!("SOLD".parse::<AuctionStatus>().ok(), Some(AuctionStatus::Sold));
        assert_eq!("expired".parse::<AuctionStatus>().ok(), Some(AuctionStatus::Expired));
        assert!("PAUSED".parse::<AuctionStatus>().is_err());
        assert_eq!(AuctionStatus::from_wire(None), AuctionStatus::Active);
        assert_eq!(AuctionStatus::from_wire(Some("bogus")), AuctionStatus::Active);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!AuctionStatus::Active.is_terminal());
        assert!(AuctionStatus::Sold.is_terminal());
        assert!(AuctionStatus::Expired.is_terminal());
    }

    #[test]
    fn test_bid_from_live_payload() {
        let raw: RawBid = serde_json::from_value(json!({
            "amount": "150",
            "bidderName": "alice",
            "timestamp": "2026-03-01T10:00:00Z"
        }))
        .expect("raw bid");
        let bid = BidRecord::from_raw(raw);

        assert!(bid.synthesized);
        assert!(bid.id.starts_with("local-"));
        assert_eq!(bid.amount, Amount::from_units(150));
        assert_eq!(bid.display_bidder(), "alice");
        assert!(bid.timestamp.is_some());
    }

    #[test]
    fn test_bid_from_snapshot_history() {
        let raw: RawBid = serde_json::from_value(json!({
            "id": 77,
            "amount": 120,
            "user": { "email": "bob@example.com" },
            "createdAt": 1767225600000_i64
        }))
        .expect("raw bid");
        let bid = BidRecord::from_raw(raw);

        assert!(!bid.synthesized);
        assert_eq!(bid.id, "77");
        assert_eq!(bid.display_bidder(), "bob@example.com");
        assert!(bid.timestamp.is_some());
    }

    #[test]
    fn test_bid_anonymous() {
        let bid = BidRecord::new(Amount::from_units(5), None, None);
        assert_eq!(bid.display_bidder(), ANONYMOUS_BIDDER);
        assert_eq!(bid.to_string(), "5 by Anonymous");
    }

    #[test]
    fn test_synthesized_ids_are_distinct() {
        let a = BidRecord::new(Amount::ZERO, None, None);
        let b = BidRecord::new(Amount::ZERO, None, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_snapshot_price_preference() {
        let snapshot = AuctionSnapshot::from_value(json!({
            "currentPrice": "100",
            "startingPrice": "50"
        }))
        .expect("snapshot");
        assert_eq!(snapshot.current_bid(), Amount::from_units(100));

        let snapshot = AuctionSnapshot::from_value(json!({
            "currentPrice": "not a number",
            "startingPrice": 50
        }))
        .expect("snapshot");
        assert_eq!(snapshot.current_bid(), Amount::from_units(50));

        let snapshot = AuctionSnapshot::from_value(json!({})).expect("snapshot");
        assert_eq!(snapshot.current_bid(), Amount::ZERO);
    }

    #[test]
    fn test_snapshot_end_time_fallback() {
        let snapshot = AuctionSnapshot::from_value(json!({
            "endsAtIST": "2026-03-01 15:30"
        }))
        .expect("snapshot");
        assert_eq!(snapshot.end_time().as_deref(), Some("2026-03-01 15:30"));
    }

    #[test]
    fn test_snapshot_skips_malformed_bids() {
        let snapshot = AuctionSnapshot::from_value(json!({
            "bids": [ { "id": "b1", "amount": 10 }, "garbage", 42 ]
        }))
        .expect("snapshot");
        let bids = snapshot.bid_records().expect("bids");
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].id, "b1");
    }

    #[test]
    fn test_view_from_snapshot() {
        let snapshot = AuctionSnapshot::from_value(json!({
            "_id": "a1",
            "title": "Vintage clock",
            "description": "Brass, 1920s",
            "currentPrice": "100",
            "status": "ACTIVE",
            "endsAt": "2026-03-01T10:00:00Z"
        }))
        .expect("snapshot");
        let view = AuctionView::from_snapshot(&snapshot, "fallback");

        assert_eq!(view.id(), "a1");
        assert_eq!(view.title(), "Vintage clock");
        assert_eq!(view.current_bid(), Amount::from_units(100));
        assert_eq!(view.suggested_bid(), Amount::from_units(101));
        assert_eq!(view.status(), AuctionStatus::Active);
        assert!(view.bids().is_empty());
        assert!(view.is_open());
    }

    #[test]
    fn test_view_uses_fallback_id() {
        let view = AuctionView::from_snapshot(&AuctionSnapshot::default(), "a9");
        assert_eq!(view.id(), "a9");
    }

    #[test]
    fn test_recent_bids_limit() {
        let mut view = AuctionView::from_snapshot(&AuctionSnapshot::default(), "a1");
        for i in 0..15 {
            view.bids.push(BidRecord::new(Amount::from_units(i), None, None));
        }
        assert_eq!(view.recent_bids(DEFAULT_HISTORY_LIMIT).len(), 10);
        assert_eq!(view.recent_bids(100).len(), 15);
    }
}
