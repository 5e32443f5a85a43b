//! Gavel Watch - headless watcher for one live auction.
//!
//! Mounts an [`gavel_sdk::AuctionSession`], follows its live channel and the
//! sold countdown, logs every state change, and optionally places one bid.
//!
//! # Components
//!
//! - [`config`]: Watcher configuration
//! - [`service`]: Main watch loop
//! - [`metrics`]: Watcher metrics

pub mod config;
pub mod metrics;
pub mod service;

pub use config::{ConfigError, WatchConfig};
pub use metrics::WatchMetrics;
pub use service::{StopReason, WatchOutcome, WatchService};
