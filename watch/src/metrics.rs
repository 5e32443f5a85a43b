//! Watcher metrics.
//!
//! Atomic counters for what one watch run saw and did.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for the watcher.
#[derive(Debug)]
pub struct WatchMetrics {
    /// Live events received.
    events_received: AtomicU64,

    /// Bids applied to the view.
    bids_applied: AtomicU64,

    /// Countdown ticks delivered.
    ticks: AtomicU64,

    /// Bids submitted over REST.
    bids_submitted: AtomicU64,

    /// Submitted or locally refused bids that did not go through.
    bids_failed: AtomicU64,

    /// Live channel drops and connect failures.
    disconnects: AtomicU64,

    /// Start time for rate calculation.
    start_time: Instant,
}

impl Default for WatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            bids_applied: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            bids_submitted: AtomicU64::new(0),
            bids_failed: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a live event.
    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a bid applied to the view.
    pub fn record_bid_applied(&self) {
        self.bids_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a countdown tick.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an accepted bid submission.
    pub fn record_bid_submitted(&self) {
        self.bids_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed bid.
    pub fn record_bid_failed(&self) {
        self.bids_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a live channel drop.
    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns live events received.
    #[must_use]
    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    /// Returns bids applied to the view.
    #[must_use]
    pub fn bids_applied(&self) -> u64 {
        self.bids_applied.load(Ordering::Relaxed)
    }

    /// Returns countdown ticks delivered.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Returns accepted bid submissions.
    #[must_use]
    pub fn bids_submitted(&self) -> u64 {
        self.bids_submitted.load(Ordering::Relaxed)
    }

    /// Returns failed bids.
    #[must_use]
    pub fn bids_failed(&self) -> u64 {
        self.bids_failed.load(Ordering::Relaxed)
    }

    /// Returns live channel drops.
    #[must_use]
    pub fn disconnects(&self) -> u64 {
        self.disconnects.load(Ordering::Relaxed)
    }

    /// Returns time since the metrics were created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns live events per second since start.
    #[must_use]
    pub fn events_per_second(&self) -> f64 {
        let secs = self.uptime().as_secs_f64();
        if secs > 0.0 {
            self.events_received() as f64 / secs
        } else {
            0.0
        }
    }
}
