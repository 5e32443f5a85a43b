//! Sold-countdown controller.
//!
//! A local, cosmetic timer: every accepted bid on an active auction restarts
//! a ten second window. When the window runs out the auction is shown as
//! awaiting finalization until the server announces the outcome. The server
//! decides when an auction closes, never this timer.
//!
//! The controller is driven by explicit [`Countdown::tick`] calls so the
//! caller owns the clock.

use crate::types::AuctionStatus;

/// Seconds in the countdown window.
pub const COUNTDOWN_WINDOW_SECS: u32 = 10;

/// Countdown phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownPhase {
    /// No countdown running.
    #[default]
    Idle,
    /// Seconds remaining in the window.
    Counting(u32),
    /// Window ran out; waiting for the server to close the auction.
    AwaitingFinalization,
}

/// Render-ready countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownState {
    /// Seconds left, or `None` when idle.
    pub seconds_remaining: Option<u32>,
    /// True once the window has run out.
    pub awaiting_finalization: bool,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was running.
    Idle,
    /// One second elapsed.
    Counted(u32),
    /// The window just ran out.
    Expired,
}

/// The countdown state machine.
#[derive(Debug, Clone)]
pub struct Countdown {
    phase: CountdownPhase,
    window: u32,
    closed: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    /// Creates an idle countdown with the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(COUNTDOWN_WINDOW_SECS)
    }

    /// Creates an idle countdown with a custom window. Zero is raised to one.
    #[must_use]
    pub fn with_window(secs: u32) -> Self {
        Self {
            phase: CountdownPhase::Idle,
            window: secs.max(1),
            closed: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CountdownPhase {
        self.phase
    }

    /// Window length in seconds.
    #[must_use]
    pub const fn window(&self) -> u32 {
        self.window
    }

    /// Returns true while the caller should deliver ticks.
    #[must_use]
    pub const fn is_counting(&self) -> bool {
        matches!(self.phase, CountdownPhase::Counting(_))
    }

    /// Returns true once a terminal status or teardown has stopped the
    /// countdown for good.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the render-ready state.
    #[must_use]
    pub const fn state(&self) -> CountdownState {
        match self.phase {
            CountdownPhase::Idle => CountdownState {
                seconds_remaining: None,
                awaiting_finalization: false,
            },
            CountdownPhase::Counting(n) => CountdownState {
                seconds_remaining: Some(n),
                awaiting_finalization: false,
            },
            CountdownPhase::AwaitingFinalization => CountdownState {
                seconds_remaining: Some(0),
                awaiting_finalization: true,
            },
        }
    }

    /// Restarts the window after a bid. Returns true if it restarted.
    ///
    /// Only an active auction restarts the window; a bid that lands while
    /// awaiting finalization starts a fresh window.
    pub fn on_bid(&mut self, status: AuctionStatus) -> bool {
        if self.closed || status != AuctionStatus::Active {
            return false;
        }
        self.phase = CountdownPhase::Counting(self.window);
        true
    }

    /// Advances the window by one second.
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            CountdownPhase::Counting(n) if n <= 1 => {
                self.phase = CountdownPhase::AwaitingFinalization;
                TickOutcome::Expired
            }
            CountdownPhase::Counting(n) => {
                self.phase = CountdownPhase::Counting(n - 1);
                TickOutcome::Counted(n - 1)
            }
            CountdownPhase::Idle | CountdownPhase::AwaitingFinalization => TickOutcome::Idle,
        }
    }

    /// Applies a status change. Any terminal status stops the countdown
    /// permanently.
    pub fn on_status(&mut self, status: AuctionStatus) {
        if status.is_terminal() {
            self.stop();
        }
    }

    /// Stops the countdown permanently.
    pub fn stop(&mut self) {
        self.phase = CountdownPhase::Idle;
        self.closed = true;
    }
}
