//! Auction state reconciler.
//!
//! Merges REST snapshots and pushed events into a single [`AuctionView`].
//! The view only moves forward: `current_bid` never decreases and a terminal
//! status is never left.
//!
//! Events that arrive before any snapshot has loaded are buffered and replayed
//! once one does. Replayed bids at or below the snapshot price are dropped
//! since the snapshot already reflects them.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::types::{Amount, AuctionSnapshot, AuctionStatus, AuctionView, BidRecord};

/// Maximum number of events held while waiting for the first snapshot.
pub const PENDING_EVENT_LIMIT: usize = 256;

/// An event received before the view loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingEvent {
    Bid(BidRecord),
    Sold(Settlement),
    Expired,
}

/// Winner and price announced when the auction sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Winner display name, if the server sent one.
    pub winner: Option<String>,
    /// Final price.
    pub final_price: Amount,
}

/// Result of applying a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    /// Prepended to the history; `current_bid` may have moved.
    Applied,
    /// Held until the first snapshot loads.
    Buffered,
    /// A bid with the same server id is already in the history.
    Duplicate,
    /// The auction is already closed.
    Ignored,
}

/// Result of applying a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Status changed to the new terminal state.
    Transitioned,
    /// Already in this state.
    Unchanged,
    /// Another terminal state arrived first.
    Ignored,
    /// Held until the first snapshot loads.
    Buffered,
}

/// Result of applying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotOutcome {
    /// True if this snapshot created the view.
    pub first_load: bool,
    /// True if the snapshot price was below the reconciled price and was kept
    /// out.
    pub regression_rejected: bool,
    /// Buffered bids applied after the first load.
    pub replayed_bids: usize,
    /// True if the status became terminal while applying the snapshot.
    pub became_terminal: bool,
}

/// Merges snapshots and pushed events for one auction.
#[derive(Debug, Clone)]
pub struct Reconciler {
    auction_id: String,
    view: Option<AuctionView>,
    pending: VecDeque<PendingEvent>,
    settlement: Option<Settlement>,
}

impl Reconciler {
    /// Creates a reconciler with nothing loaded.
    #[must_use]
    pub fn new(auction_id: impl Into<String>) -> Self {
        Self {
            auction_id: auction_id.into(),
            view: None,
            pending: VecDeque::new(),
            settlement: None,
        }
    }

    /// Returns the auction id.
    #[must_use]
    pub fn auction_id(&self) -> &str {
        &self.auction_id
    }

    /// Returns the merged view once a snapshot has loaded.
    #[must_use]
    pub fn view(&self) -> Option<&AuctionView> {
        self.view.as_ref()
    }

    /// Returns true once a snapshot has loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.view.is_some()
    }

    /// Returns the current status, if loaded.
    #[must_use]
    pub fn status(&self) -> Option<AuctionStatus> {
        self.view.as_ref().map(AuctionView::status)
    }

    /// Returns the current bid, if loaded.
    #[must_use]
    pub fn current_bid(&self) -> Option<Amount> {
        self.view.as_ref().map(AuctionView::current_bid)
    }

    /// Returns the sale announcement that closed the auction, if any.
    #[must_use]
    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    /// Number of events waiting for the first snapshot.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Applies a REST or pushed snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &AuctionSnapshot) -> SnapshotOutcome {
        let mut outcome = SnapshotOutcome::default();
        if self.view.is_none() {
            return self.load_first(snapshot);
        }
        let Some(view) = self.view.as_mut() else {
            return outcome;
        };

        let incoming = snapshot.current_bid();
        if incoming < view.current_bid {
            warn!(
                "Snapshot for auction {} reports {} below reconciled {}, keeping reconciled state",
                view.id, incoming, view.current_bid
            );
            outcome.regression_rejected = true;
        } else {
            view.current_bid = incoming;
            if let Some(bids) = snapshot.bid_records() {
                view.bids = bids;
            }
        }

        if view.title.is_empty() {
            view.title = snapshot.title.clone().unwrap_or_default();
        }
        if view.description.is_empty() {
            view.description = snapshot.description.clone().unwrap_or_default();
        }
        if view.image_url.is_none() {
            view.image_url = snapshot.image_url.clone();
        }
        if let Some(end_time) = snapshot.end_time() {
            view.end_time = Some(end_time);
        }

        let status = snapshot.status();
        if view.status.is_terminal() {
            if status != view.status {
                debug!(
                    "Snapshot status {} ignored, auction {} already {}",
                    status, view.id, view.status
                );
            }
        } else if status.is_terminal() {
            view.status = status;
            outcome.became_terminal = true;
        }

        outcome
    }

    fn load_first(&mut self, snapshot: &AuctionSnapshot) -> SnapshotOutcome {
        let view = AuctionView::from_snapshot(snapshot, &self.auction_id);
        let baseline = view.current_bid;
        let mut outcome = SnapshotOutcome {
            first_load: true,
            became_terminal: view.status.is_terminal(),
            ..SnapshotOutcome::default()
        };
        self.view = Some(view);

        for event in std::mem::take(&mut self.pending) {
            match event {
                PendingEvent::Bid(record) if record.amount <= baseline => {
                    debug!("Dropping buffered bid {} already reflected in snapshot", record);
                }
                PendingEvent::Bid(record) => {
                    if self.apply_bid(record) == BidOutcome::Applied {
                        outcome.replayed_bids += 1;
                    }
                }
                PendingEvent::Sold(settlement) => {
                    if self.apply_sold(settlement.winner, settlement.final_price)
                        == StatusOutcome::Transitioned
                    {
                        outcome.became_terminal = true;
                    }
                }
                PendingEvent::Expired => {
                    if self.apply_expired() == StatusOutcome::Transitioned {
                        outcome.became_terminal = true;
                    }
                }
            }
        }
        outcome
    }

    /// Applies a confirmed bid.
    ///
    /// The record is prepended to the history. `current_bid` follows it
    /// unless the record is below the current price, in which case the
    /// out-of-order bid is kept in the history but the price does not move.
    pub fn apply_bid(&mut self, record: BidRecord) -> BidOutcome {
        let Some(view) = self.view.as_mut() else {
            buffer(&mut self.pending, &self.auction_id, PendingEvent::Bid(record));
            return BidOutcome::Buffered;
        };

        if view.status.is_terminal() {
            debug!("Ignoring bid {} on closed auction {}", record, view.id);
            return BidOutcome::Ignored;
        }

        if !record.synthesized
            && view
                .bids
                .iter()
                .any(|b| !b.synthesized && b.id == record.id)
        {
            debug!("Ignoring duplicate bid {}", record.id);
            return BidOutcome::Duplicate;
        }

        if record.amount >= view.current_bid {
            view.current_bid = record.amount;
        } else {
            warn!(
                "Out-of-order bid {} below current {} on auction {}",
                record.amount, view.current_bid, view.id
            );
        }
        view.bids.insert(0, record);
        BidOutcome::Applied
    }

    /// Marks the auction sold to `winner` at `final_price`. The first
    /// terminal status wins; the settlement is kept only when this call
    /// closes the auction.
    pub fn apply_sold(&mut self, winner: Option<String>, final_price: Amount) -> StatusOutcome {
        let settlement = Settlement {
            winner,
            final_price,
        };
        let outcome = self.apply_terminal(
            AuctionStatus::Sold,
            PendingEvent::Sold(settlement.clone()),
        );
        if outcome == StatusOutcome::Transitioned {
            self.settlement = Some(settlement);
        }
        outcome
    }

    /// Marks the auction expired. The first terminal status wins.
    pub fn apply_expired(&mut self) -> StatusOutcome {
        self.apply_terminal(AuctionStatus::Expired, PendingEvent::Expired)
    }

    fn apply_terminal(&mut self, status: AuctionStatus, pending: PendingEvent) -> StatusOutcome {
        let Some(view) = self.view.as_mut() else {
            buffer(&mut self.pending, &self.auction_id, pending);
            return StatusOutcome::Buffered;
        };

        match view.status {
            AuctionStatus::Active => {
                view.status = status;
                StatusOutcome::Transitioned
            }
            current if current == status => StatusOutcome::Unchanged,
            current => {
                debug!(
                    "Ignoring {} for auction {}, already {}",
                    status, view.id, current
                );
                StatusOutcome::Ignored
            }
        }
    }
}

fn buffer(pending: &mut VecDeque<PendingEvent>, auction_id: &str, event: PendingEvent) {
    if pending.len() >= PENDING_EVENT_LIMIT {
        warn!(
            "Pending event buffer full for auction {}, dropping oldest",
            auction_id
        );
        pending.pop_front();
    }
    pending.push_back(event);
}
