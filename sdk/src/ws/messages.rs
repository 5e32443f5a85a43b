//! Live channel message types.
//!
//! Every frame is a JSON text message naming an event and carrying its
//! payload: `{"event": "NEW_BID", "data": {...}}`. The two-element array form
//! `["NEW_BID", {...}]` is accepted on input as well.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::WsError;
use crate::types::{Amount, AuctionSnapshot, BidRecord, RawBid};

/// Inbound event name for viewer counts.
pub const VIEWER_COUNT: &str = "VIEWER_COUNT";
/// Inbound event name for full snapshots.
pub const AUCTION_STATE: &str = "AUCTION_STATE";
/// Inbound event name for confirmed bids.
pub const NEW_BID: &str = "NEW_BID";
/// Inbound event name for the ending-soon hint.
pub const AUCTION_ENDING_SOON: &str = "AUCTION_ENDING_SOON";
/// Inbound event name for a sale.
pub const AUCTION_SOLD: &str = "AUCTION_SOLD";
/// Inbound event name for an expiry without sale.
pub const AUCTION_EXPIRED: &str = "AUCTION_EXPIRED";

/// Client-to-server messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Join the room of an auction.
    #[serde(rename = "joinAuction")]
    JoinAuction(String),
    /// Leave the room of an auction.
    #[serde(rename = "leaveAuction")]
    LeaveAuction(String),
}

impl ClientMessage {
    /// Encodes the message as a text frame.
    ///
    /// # Errors
    ///
    /// Returns `WsError::Serialization` if encoding fails.
    pub fn to_frame(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(|e| WsError::Serialization(e.to_string()))
    }
}

/// Events surfaced by the live channel, in transport order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// Channel established and room joined.
    Connected,
    /// Channel lost.
    Disconnected(String),
    /// Channel could not be established.
    ConnectError(String),
    /// Number of people watching this auction.
    ViewerCount(u64),
    /// Full auction state pushed by the server.
    Snapshot(AuctionSnapshot),
    /// A server-confirmed bid.
    Bid(BidRecord),
    /// Advisory: the server expects the auction to close soon.
    EndingSoon(u64),
    /// The auction sold.
    Sold {
        /// Winner display name.
        winner: Option<String>,
        /// Final price.
        final_price: Amount,
    },
    /// The auction ended without a sale.
    Expired,
}

impl LiveEvent {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected(_) => "disconnected",
            Self::ConnectError(_) => "connect_error",
            Self::ViewerCount(_) => "viewer_count",
            Self::Snapshot(_) => "snapshot",
            Self::Bid(_) => "bid",
            Self::EndingSoon(_) => "ending_soon",
            Self::Sold { .. } => "sold",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for LiveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected(reason) | Self::ConnectError(reason) => {
                write!(f, "{} ({})", self.kind(), reason)
            }
            Self::ViewerCount(count) => write!(f, "viewer_count {}", count),
            Self::Bid(bid) => write!(f, "bid {}", bid),
            Self::EndingSoon(secs) => write!(f, "ending_soon {}s", secs),
            Self::Sold {
                winner,
                final_price,
            } => write!(
                f,
                "sold to {} for {}",
                winner.as_deref().unwrap_or("unknown"),
                final_price
            ),
            _ => write!(f, "{}", self.kind()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewerCountPayload {
    #[serde(default)]
    auction_id: Option<Value>,
    #[serde(default)]
    count: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndingSoonPayload {
    #[serde(default)]
    seconds_remaining: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SoldPayload {
    #[serde(default)]
    winner_name: Option<String>,
    #[serde(default)]
    final_price: Amount,
}

/// Splits a text frame into its event name and payload.
///
/// # Errors
///
/// Returns `WsError::Deserialization` if the frame is neither an
/// `{event, data}` object nor an `[event, data]` array.
pub fn split_frame(text: &str) -> Result<(String, Value), WsError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| WsError::Deserialization(e.to_string()))?;

    match value {
        Value::Array(mut items) if !items.is_empty() => {
            let data = if items.len() > 1 {
                items.swap_remove(1)
            } else {
                Value::Null
            };
            match items.swap_remove(0) {
                Value::String(event) => Ok((event, data)),
                other => Err(WsError::Deserialization(format!(
                    "event name must be a string, got {}",
                    other
                ))),
            }
        }
        value @ Value::Object(_) => {
            let frame: ObjectFrame = serde_json::from_value(value)
                .map_err(|e| WsError::Deserialization(e.to_string()))?;
            Ok((frame.event, frame.data))
        }
        other => Err(WsError::Deserialization(format!(
            "unexpected frame: {}",
            other
        ))),
    }
}

/// Decodes a text frame into a [`LiveEvent`] for the given auction.
///
/// Returns `Ok(None)` for frames this channel ignores: unknown event names and
/// viewer counts addressed to another auction. Malformed numeric fields are
/// coerced to zero.
///
/// # Errors
///
/// Returns `WsError::Deserialization` if the frame itself is malformed.
pub fn decode_event(text: &str, auction_id: &str) -> Result<Option<LiveEvent>, WsError> {
    let (event, data) = split_frame(text)?;

    let decoded = match event.as_str() {
        VIEWER_COUNT => {
            let payload: ViewerCountPayload = from_payload(data)?;
            let addressed = payload
                .auction_id
                .as_ref()
                .map(|id| id_matches(id, auction_id))
                .unwrap_or(true);
            addressed.then(|| LiveEvent::ViewerCount(coerce_count(&payload.count)))
        }
        AUCTION_STATE => Some(LiveEvent::Snapshot(from_payload_or_default(data)?)),
        NEW_BID => {
            let raw: RawBid = from_payload(data)?;
            Some(LiveEvent::Bid(BidRecord::from_raw(raw)))
        }
        AUCTION_ENDING_SOON => {
            let payload: EndingSoonPayload = from_payload_or_default(data)?;
            Some(LiveEvent::EndingSoon(coerce_count(&payload.seconds_remaining)))
        }
        AUCTION_SOLD => {
            let payload: SoldPayload = from_payload_or_default(data)?;
            Some(LiveEvent::Sold {
                winner: payload.winner_name,
                final_price: payload.final_price,
            })
        }
        AUCTION_EXPIRED => Some(LiveEvent::Expired),
        _ => None,
    };

    Ok(decoded)
}

fn from_payload<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T, WsError> {
    serde_json::from_value(data).map_err(|e| WsError::Deserialization(e.to_string()))
}

fn from_payload_or_default<T>(data: Value) -> Result<T, WsError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    from_payload(data)
}

fn id_matches(value: &Value, auction_id: &str) -> bool {
    match value {
        Value::String(s) => s == auction_id,
        Value::Number(n) => n.to_string() == auction_id,
        _ => false,
    }
}

/// Best-effort non-negative integer read; anything unreadable is zero.
fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
