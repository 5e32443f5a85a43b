//! Core types for the Gavel SDK.
//!
//! This module provides the auction, bid and account types shared by the
//! REST client, the live channel and the reconciler.

pub mod account;
pub mod amount;
pub mod auction;

pub use account::{
    AuctionPage, AuctionSummary, AuthSession, BidReceipt, Credentials, NewAuction, Pagination,
    Registration, UserProfile,
};
pub use amount::Amount;
pub use auction::{
    AuctionSnapshot, AuctionStatus, AuctionView, BidRecord, RawBid, RawBidder,
    DEFAULT_HISTORY_LIMIT,
};
