//! Gavel SDK - Rust client library for Gavel live auctions.
//!
//! This crate provides the types, clients and state handling needed to show
//! one auction live: a REST client for listings, snapshots and bids, a
//! WebSocket client for pushed events, and a reconciler that merges both into
//! a single consistent view.
//!
//! # Modules
//!
//! - [`types`]: [`Amount`], [`AuctionStatus`], [`BidRecord`], [`AuctionView`]
//!   and the REST payloads
//! - [`client`]: [`AuctionClient`] over HTTP
//! - [`ws`]: [`LiveAuctionClient`] and the [`LiveEvent`] stream
//! - [`live`]: [`Reconciler`], [`Countdown`], [`BidGuard`] and
//!   [`AuctionSession`]
//!
//! # Example
//!
//! ```rust
//! use gavel_sdk::{Amount, AuctionSnapshot, Reconciler};
//!
//! let snapshot = AuctionSnapshot::from_value(serde_json::json!({
//!     "id": "a1",
//!     "currentPrice": "100",
//!     "status": "ACTIVE"
//! }))
//! .unwrap();
//!
//! let mut reconciler = Reconciler::new("a1");
//! reconciler.apply_snapshot(&snapshot);
//! assert_eq!(reconciler.current_bid(), Some(Amount::from_units(100)));
//! ```

pub mod client;
pub mod error;
pub mod live;
pub mod types;
pub mod ws;

pub use client::{AuctionClient, ClientConfig, ClientError, UnauthorizedListener};
pub use error::SdkError;
pub use live::{
    AuctionSession, BidError, BidGuard, Countdown, CountdownState, Notice, Reconciler,
    Settlement, COUNTDOWN_WINDOW_SECS,
};
pub use types::{
    Amount, AuctionPage, AuctionSnapshot, AuctionStatus, AuctionSummary, AuctionView, BidRecord,
    UserProfile,
};
pub use ws::{ConnectionState, LiveAuctionClient, LiveEvent, WsConfig, WsError};
