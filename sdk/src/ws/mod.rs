//! Live auction channel.
//!
//! This module provides the WebSocket client that joins one auction room and
//! streams its pushed events (viewer counts, bids, ending-soon hints and
//! terminal notifications).
//!
//! # Example
//!
//! ```rust,ignore
//! use gavel_sdk::ws::{LiveAuctionClient, LiveEvent, WsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut live = LiveAuctionClient::new(WsConfig::new("wss://api.gavel.example/live"))?;
//!
//!     if live.open("a1", Some("token")).await {
//!         while let Some(event) = live.next_event().await {
//!             println!("Received: {:?}", event);
//!             if matches!(event, LiveEvent::Sold { .. } | LiveEvent::Expired) {
//!                 break;
//!             }
//!         }
//!     }
//!
//!     live.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod messages;

pub use client::{ConnectionState, LiveAuctionClient, LiveChannel};
pub use config::WsConfig;
pub use error::WsError;
pub use messages::{ClientMessage, LiveEvent};
