//! Main watch service.
//!
//! Mounts one [`AuctionSession`] and drives it from a single event loop:
//! the snapshot fetch, live events, the one-second countdown clock and a
//! shutdown signal all feed the same `select!`. The snapshot fetch starts
//! before the live handshake, and shutdown is honored while it is pending.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gavel_sdk::{
    AuctionClient, AuctionSession, AuctionStatus, AuctionView, LiveAuctionClient, Notice,
};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::{ConfigError, WatchConfig};
use super::metrics::WatchMetrics;

const TICK: Duration = Duration::from_secs(1);

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The auction reached a terminal status.
    Finished(AuctionStatus),
    /// The shutdown signal fired.
    Shutdown,
    /// No live channel left and nothing else to wait for.
    Idle,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct WatchOutcome {
    /// Why the run ended.
    pub reason: StopReason,
    /// Final view, if one ever loaded.
    pub view: Option<AuctionView>,
}

/// The watch service.
pub struct WatchService {
    config: WatchConfig,
    metrics: Arc<WatchMetrics>,
}

impl WatchService {
    /// Creates a new watch service.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: Arc::new(WatchMetrics::new()),
        })
    }

    /// Returns the metrics.
    #[must_use]
    pub fn metrics(&self) -> Arc<WatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Watches the auction until it closes, the live channel ends with
    /// nothing left to wait for, or `shutdown` resolves. The session is
    /// always unmounted before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST or live client cannot be built.
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<WatchOutcome>
    where
        F: Future<Output = ()>,
    {
        let rest = AuctionClient::new(self.config.client_config())
            .context("failed to build REST client")?
            .with_unauthorized_listener(|| warn!("Session expired, sign in again"));
        let live = LiveAuctionClient::new(self.config.ws_config())
            .context("failed to build live client")?;

        info!("Watching auction {}", self.config.auction_id);
        let mut session = AuctionSession::new(self.config.auction_id.clone(), rest, live);

        let reason = self.drive(&mut session, shutdown).await;
        session.unmount().await;

        info!(
            "Stopped watching auction {} ({:?}): {} events, {} bids applied, {:.2} events/s",
            self.config.auction_id,
            reason,
            self.metrics.events_received(),
            self.metrics.bids_applied(),
            self.metrics.events_per_second()
        );

        Ok(WatchOutcome {
            reason,
            view: session.view().cloned(),
        })
    }

    async fn drive<F>(&self, session: &mut AuctionSession, shutdown: F) -> StopReason
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut fetch = Box::pin(session.fetch_snapshot());
        let mut fetch_pending = true;
        let mut early = None;
        let mut pending_bid = self.config.bid.clone();

        let connected = {
            let connect = session.connect(self.config.token.as_deref());
            tokio::pin!(connect);
            loop {
                tokio::select! {
                    () = &mut shutdown => break None,
                    result = &mut fetch, if fetch_pending => {
                        fetch_pending = false;
                        early = Some(result);
                    }
                    opened = &mut connect => break Some(opened),
                }
            }
        };
        let Some(opened) = connected else {
            info!("Shutdown requested while connecting");
            if let Some(result) = early.take() {
                for notice in &session.apply_snapshot_result(result) {
                    self.report(notice);
                }
            }
            return StopReason::Shutdown;
        };
        debug!("Live handshake finished, opened: {}", opened);
        // A failed handshake still leaves a channel that reports the error.
        let mut live_open = session.has_live_channel();

        let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let notices = if let Some(result) = early.take() {
                session.apply_snapshot_result(result)
            } else {
                tokio::select! {
                    () = &mut shutdown => {
                        info!("Shutdown requested");
                        return StopReason::Shutdown;
                    }
                    result = &mut fetch, if fetch_pending => {
                        fetch_pending = false;
                        session.apply_snapshot_result(result)
                    }
                    event = session.next_live_event(), if live_open => match event {
                        Some(event) => {
                            self.metrics.record_event();
                            session.handle_event(event)
                        }
                        None => {
                            debug!("Live channel ended");
                            live_open = false;
                            Vec::new()
                        }
                    },
                    _ = ticker.tick(), if session.is_counting() => {
                        self.metrics.record_tick();
                        session.tick()
                    }
                }
            };

            for notice in &notices {
                self.report(notice);
                if matches!(notice, Notice::CountdownStarted(_)) {
                    ticker.reset();
                }
            }
            if notices
                .iter()
                .any(|n| matches!(n, Notice::Loaded { .. } | Notice::NewBid { .. }))
            {
                self.log_history(session);
            }

            if session.view().is_some_and(AuctionView::is_open) {
                if let Some(input) = pending_bid.take() {
                    self.place_bid(session, &input).await;
                }
            }

            if let Some(view) = session.view().filter(|v| !v.is_open()) {
                return StopReason::Finished(view.status());
            }
            if !live_open && !fetch_pending && !session.is_counting() {
                info!("Nothing left to watch");
                return StopReason::Idle;
            }
        }
    }

    async fn place_bid(&self, session: &AuctionSession, input: &str) {
        match session.submit_bid(input).await {
            Ok(receipt) => {
                self.metrics.record_bid_submitted();
                info!(
                    "Bid {} accepted: {}",
                    input,
                    receipt.message.as_deref().unwrap_or("waiting for confirmation")
                );
            }
            Err(err) => {
                self.metrics.record_bid_failed();
                warn!("Bid {} not placed: {}", input, err);
            }
        }
    }

    fn report(&self, notice: &Notice) {
        match notice {
            Notice::ConnectionLost(_) | Notice::ConnectionFailed(_) => {
                self.metrics.record_disconnect();
                warn!("{}", notice);
            }
            Notice::LoadFailed { .. } => warn!("{}", notice),
            Notice::Viewers(_) | Notice::CountdownStarted(_) => debug!("{}", notice),
            Notice::NewBid { .. } => {
                self.metrics.record_bid_applied();
                info!("{}", notice);
            }
            _ => info!("{}", notice),
        }
    }

    fn log_history(&self, session: &AuctionSession) {
        let Some(view) = session.view() else {
            return;
        };
        debug!(
            "Auction {} \"{}\" at {} ({}), next bid {}",
            view.id(),
            view.title(),
            view.current_bid(),
            view.status(),
            view.suggested_bid()
        );
        for bid in view.recent_bids(self.config.history_limit) {
            debug!("  {}", bid);
        }
    }
}
