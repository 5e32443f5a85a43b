//! HTTP client for the Gavel REST API.
//!
//! This module provides a type-safe HTTP client for listing auctions,
//! loading snapshots, placing bids and signing in.
//!
//! # Example
//!
//! ```rust,ignore
//! use gavel_sdk::client::{AuctionClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AuctionClient::new(ClientConfig::new("https://api.gavel.example"))?
//!         .with_unauthorized_listener(|| eprintln!("signed out"));
//!
//!     let page = client.list_auctions(1, 20).await?;
//!     println!("Found {} auctions", page.auctions.len());
//!
//!     let snapshot = client.get_auction("a1").await?;
//!     println!("Current price: {}", snapshot.current_bid());
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;

pub use auth::UnauthorizedListener;
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::AuctionClient;
