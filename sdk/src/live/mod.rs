//! Live auction core.
//!
//! Everything between the wire and the screen:
//!
//! - [`Reconciler`] merges snapshots and pushed events into one view.
//! - [`Countdown`] runs the cosmetic sold-countdown.
//! - [`BidGuard`] checks bid input before it is sent.
//! - [`AuctionSession`] wires those to the REST and live clients.

pub mod bid;
pub mod countdown;
pub mod reconciler;
pub mod session;

pub use bid::{BidError, BidGuard};
pub use countdown::{
    Countdown, CountdownPhase, CountdownState, TickOutcome, COUNTDOWN_WINDOW_SECS,
};
pub use reconciler::{
    BidOutcome, Reconciler, Settlement, SnapshotOutcome, StatusOutcome, PENDING_EVENT_LIMIT,
};
pub use session::{AuctionSession, Notice};
