//! Auction screen host.
//!
//! [`AuctionSession`] owns everything one open auction needs: the REST
//! client, the live channel, the reconciler and the countdown. It turns
//! inputs (snapshots, live events, clock ticks, bid submissions) into view
//! updates and user-facing [`Notice`]s.
//!
//! Lifecycle:
//!
//! 1. [`AuctionSession::new`] attaches the session and
//!    [`AuctionSession::connect`] opens the live channel;
//!    [`AuctionSession::mount`] does both. The handshake is bounded by the
//!    live client's connect timeout, and callers that must stay responsive
//!    can start the snapshot fetch before awaiting `connect`.
//! 2. The caller loads the snapshot, either inline with
//!    [`AuctionSession::load_snapshot`] or concurrently via
//!    [`AuctionSession::fetch_snapshot`] + [`AuctionSession::apply_snapshot_result`].
//!    Live events and the snapshot may arrive in any order.
//! 3. [`AuctionSession::unmount`] stops the countdown, leaves and closes the
//!    channel, then detaches. Anything delivered afterwards is dropped.

use std::fmt;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::client::{AuctionClient, ClientError};
use crate::types::{Amount, AuctionSnapshot, AuctionStatus, AuctionView, BidReceipt, BidRecord};
use crate::ws::{ConnectionState, LiveAuctionClient, LiveEvent};

use super::bid::{BidError, BidGuard};
use super::countdown::{Countdown, CountdownState, TickOutcome};
use super::reconciler::{BidOutcome, Reconciler, StatusOutcome};

/// A user-facing message produced by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Live channel connected.
    Connected,
    /// Live channel dropped.
    ConnectionLost(String),
    /// Live channel could not connect.
    ConnectionFailed(String),
    /// Viewer count changed.
    Viewers(u64),
    /// First snapshot loaded.
    Loaded {
        /// Highest bid at load time.
        current_bid: Amount,
        /// Status at load time.
        status: AuctionStatus,
    },
    /// Snapshot could not be loaded.
    LoadFailed {
        /// Error text.
        message: String,
        /// True if retrying may help.
        retryable: bool,
    },
    /// A confirmed bid was applied.
    NewBid {
        /// The bid.
        bid: BidRecord,
        /// Default value for the next bid.
        suggested: Amount,
    },
    /// Countdown window (re)started.
    CountdownStarted(u32),
    /// Countdown ran out; waiting for the server.
    Finalizing,
    /// Server says the auction ends soon.
    EndingSoon(u64),
    /// Auction sold.
    Sold {
        /// Winner display name.
        winner: Option<String>,
        /// Final price.
        final_price: Amount,
    },
    /// Auction expired unsold.
    Expired,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Live updates connected"),
            Self::ConnectionLost(reason) => write!(f, "Live updates lost: {}", reason),
            Self::ConnectionFailed(reason) => write!(f, "Could not connect to live updates: {}", reason),
            Self::Viewers(n) => write!(f, "{} watching", n),
            Self::Loaded {
                current_bid,
                status,
            } => write!(f, "Auction loaded at {} ({})", current_bid, status),
            Self::LoadFailed { message, retryable } => {
                if *retryable {
                    write!(f, "Failed to load auction: {} (retry)", message)
                } else {
                    write!(f, "Failed to load auction: {}", message)
                }
            }
            Self::NewBid { bid, .. } => write!(f, "New bid: {}", bid),
            Self::CountdownStarted(secs) => write!(f, "Selling in {}s", secs),
            Self::Finalizing => write!(f, "Finalizing..."),
            Self::EndingSoon(secs) => write!(f, "Auction ending in {} seconds!", secs),
            Self::Sold {
                winner,
                final_price,
            } => write!(
                f,
                "SOLD to {} for {}",
                winner.as_deref().unwrap_or("the highest bidder"),
                final_price
            ),
            Self::Expired => write!(f, "Auction expired"),
        }
    }
}

/// Host for one open auction.
#[derive(Debug)]
pub struct AuctionSession {
    auction_id: String,
    rest: AuctionClient,
    live: LiveAuctionClient,
    reconciler: Reconciler,
    countdown: Countdown,
    mounted: bool,
}

impl AuctionSession {
    /// Creates a mounted session with no live channel yet.
    #[must_use]
    pub fn new(auction_id: impl Into<String>, rest: AuctionClient, live: LiveAuctionClient) -> Self {
        let auction_id = auction_id.into();
        Self {
            reconciler: Reconciler::new(auction_id.clone()),
            auction_id,
            rest,
            live,
            countdown: Countdown::new(),
            mounted: true,
        }
    }

    /// Opens the live channel for this auction, replacing any previous one.
    ///
    /// Returns false when no channel could be established: no credential,
    /// a failed or timed out handshake, or the session is already unmounted.
    /// A missing credential leaves the session without live updates; it
    /// still loads and accepts bids over REST.
    pub async fn connect(&mut self, credential: Option<&str>) -> bool {
        if !self.mounted {
            return false;
        }
        let opened = self.live.open(&self.auction_id, credential).await;
        if opened {
            info!("Mounted auction {} with live updates", self.auction_id);
        } else {
            info!("Mounted auction {} without live updates", self.auction_id);
        }
        opened
    }

    /// Creates a session and opens its live channel.
    pub async fn mount(
        auction_id: impl Into<String>,
        rest: AuctionClient,
        live: LiveAuctionClient,
        credential: Option<&str>,
    ) -> Self {
        let mut session = Self::new(auction_id, rest, live);
        session.connect(credential).await;
        session
    }

    /// Auction id.
    #[must_use]
    pub fn auction_id(&self) -> &str {
        &self.auction_id
    }

    /// Returns false once unmounted.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns the merged view once loaded.
    #[must_use]
    pub fn view(&self) -> Option<&AuctionView> {
        self.reconciler.view()
    }

    /// Returns the countdown state.
    #[must_use]
    pub const fn countdown(&self) -> CountdownState {
        self.countdown.state()
    }

    /// Returns true while the caller should deliver one-second ticks.
    #[must_use]
    pub const fn is_counting(&self) -> bool {
        self.mounted && self.countdown.is_counting()
    }

    /// Returns true once the auction reached `Sold` or `Expired`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.reconciler.status().is_some_and(|s| s.is_terminal())
    }

    /// Returns true if a live channel exists.
    #[must_use]
    pub fn has_live_channel(&self) -> bool {
        self.live.has_channel()
    }

    /// Live connection state.
    pub async fn connection_state(&self) -> ConnectionState {
        self.live.connection_state().await
    }

    /// Returns a future fetching the snapshot, detached from the session.
    ///
    /// Feed its output to [`AuctionSession::apply_snapshot_result`].
    pub fn fetch_snapshot(
        &self,
    ) -> impl Future<Output = Result<AuctionSnapshot, ClientError>> + Send + 'static {
        let rest = self.rest.clone();
        let auction_id = self.auction_id.clone();
        async move { rest.get_auction(&auction_id).await }
    }

    /// Fetches and applies the snapshot.
    pub async fn load_snapshot(&mut self) -> Vec<Notice> {
        let result = self.fetch_snapshot().await;
        self.apply_snapshot_result(result)
    }

    /// Applies a fetched snapshot. Ignored once unmounted.
    pub fn apply_snapshot_result(
        &mut self,
        result: Result<AuctionSnapshot, ClientError>,
    ) -> Vec<Notice> {
        if !self.mounted {
            debug!("Discarding snapshot for unmounted auction {}", self.auction_id);
            return Vec::new();
        }

        match result {
            Ok(snapshot) => self.apply_snapshot(&snapshot),
            Err(err) => {
                warn!("Failed to load auction {}: {}", self.auction_id, err);
                vec![Notice::LoadFailed {
                    retryable: err.is_retryable(),
                    message: err.server_message().map_or_else(|| err.to_string(), str::to_string),
                }]
            }
        }
    }

    /// Waits for the next live event. Returns `None` when there is no
    /// channel or it has ended.
    pub async fn next_live_event(&mut self) -> Option<LiveEvent> {
        self.live.next_event().await
    }

    /// Applies a live event.
    pub fn handle_event(&mut self, event: LiveEvent) -> Vec<Notice> {
        if !self.mounted {
            debug!("Discarding {} for unmounted auction {}", event.kind(), self.auction_id);
            return Vec::new();
        }

        match event {
            LiveEvent::Connected => vec![Notice::Connected],
            LiveEvent::Disconnected(reason) => vec![Notice::ConnectionLost(reason)],
            LiveEvent::ConnectError(reason) => vec![Notice::ConnectionFailed(reason)],
            LiveEvent::ViewerCount(count) => vec![Notice::Viewers(count)],
            LiveEvent::Snapshot(snapshot) => self.apply_snapshot(&snapshot),
            LiveEvent::Bid(record) => self.apply_bid(record),
            LiveEvent::EndingSoon(secs) => vec![Notice::EndingSoon(secs)],
            LiveEvent::Sold {
                winner,
                final_price,
            } => match self.reconciler.apply_sold(winner, final_price) {
                StatusOutcome::Transitioned => {
                    self.countdown.on_status(AuctionStatus::Sold);
                    info!("Auction {} sold for {}", self.auction_id, final_price);
                    vec![self.sold_notice(final_price)]
                }
                _ => Vec::new(),
            },
            LiveEvent::Expired => match self.reconciler.apply_expired() {
                StatusOutcome::Transitioned => {
                    self.countdown.on_status(AuctionStatus::Expired);
                    info!("Auction {} expired", self.auction_id);
                    vec![Notice::Expired]
                }
                _ => Vec::new(),
            },
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Vec<Notice> {
        if !self.mounted {
            return Vec::new();
        }
        match self.countdown.tick() {
            TickOutcome::Expired => vec![Notice::Finalizing],
            TickOutcome::Counted(_) | TickOutcome::Idle => Vec::new(),
        }
    }

    /// Validates and submits a bid.
    ///
    /// The view is not touched: an accepted bid shows up once the server
    /// broadcasts it on the live channel.
    ///
    /// # Errors
    ///
    /// Returns a local [`BidError`] if validation fails, or the mapped
    /// server/transport error if the request fails.
    pub async fn submit_bid(&self, input: &str) -> Result<BidReceipt, BidError> {
        let amount = BidGuard::validate_for(input, self.view())?;
        debug!("Placing bid {} on auction {}", amount, self.auction_id);
        let receipt = self.rest.place_bid(&self.auction_id, amount).await?;
        info!("Bid {} submitted on auction {}", amount, self.auction_id);
        Ok(receipt)
    }

    /// Tears the session down: stops the countdown, leaves and closes the
    /// live channel, then detaches. Safe to call more than once.
    pub async fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.countdown.stop();
        self.live.close().await;
        self.mounted = false;
        info!("Unmounted auction {}", self.auction_id);
    }

    fn apply_snapshot(&mut self, snapshot: &AuctionSnapshot) -> Vec<Notice> {
        let outcome = self.reconciler.apply_snapshot(snapshot);
        let Some(view) = self.reconciler.view() else {
            return Vec::new();
        };
        let (current_bid, status) = (view.current_bid(), view.status());

        let mut notices = Vec::new();
        if outcome.first_load {
            info!(
                "Loaded auction {} at {} ({})",
                self.auction_id, current_bid, status
            );
            notices.push(Notice::Loaded {
                current_bid,
                status,
            });
        }
        if outcome.replayed_bids > 0 && self.countdown.on_bid(status) {
            notices.push(Notice::CountdownStarted(self.countdown.window()));
        }
        if outcome.became_terminal {
            self.countdown.on_status(status);
            notices.push(match status {
                AuctionStatus::Expired => Notice::Expired,
                _ => self.sold_notice(current_bid),
            });
        }
        notices
    }

    /// Sold notice from the announced settlement, or `fallback_price` when
    /// the sale was only seen in a snapshot.
    fn sold_notice(&self, fallback_price: Amount) -> Notice {
        match self.reconciler.settlement() {
            Some(settlement) => Notice::Sold {
                winner: settlement.winner.clone(),
                final_price: settlement.final_price,
            },
            None => Notice::Sold {
                winner: None,
                final_price: fallback_price,
            },
        }
    }

    fn apply_bid(&mut self, record: BidRecord) -> Vec<Notice> {
        match self.reconciler.apply_bid(record.clone()) {
            BidOutcome::Applied => {}
            BidOutcome::Buffered => {
                debug!("Buffered bid {} until auction {} loads", record, self.auction_id);
                return Vec::new();
            }
            BidOutcome::Duplicate | BidOutcome::Ignored => return Vec::new(),
        }

        let Some(view) = self.reconciler.view() else {
            return Vec::new();
        };
        let (status, suggested) = (view.status(), view.suggested_bid());

        let mut notices = vec![Notice::NewBid {
            bid: record,
            suggested,
        }];
        if self.countdown.on_bid(status) {
            notices.push(Notice::CountdownStarted(self.countdown.window()));
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::WsConfig;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn spawn_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    fn api_router(bids: Arc<Mutex<Vec<Value>>>) -> Router {
        Router::new()
            .route(
                "/auctions/{id}",
                get(|Path(id): Path<String>| async move {
                    Json(json!({
                        "_id": id,
                        "title": "Clock",
                        "currentPrice": "100",
                        "status": "ACTIVE",
                        "bids": []
                    }))
                }),
            )
            .route(
                "/auctions/{id}/bid",
                post(move |Json(body): Json<Value>| {
                    let bids = Arc::clone(&bids);
                    async move {
                        let amount = body["amount"].as_f64().unwrap_or_default();
                        bids.lock().expect("lock").push(body);
                        if amount > 1000.0 {
                            return (
                                StatusCode::BAD_REQUEST,
                                Json(json!({ "message": "Insufficient balance" })),
                            );
                        }
                        (StatusCode::OK, Json(json!({ "message": "Bid placed" })))
                    }
                }),
            )
    }

    async fn session(base: &str) -> AuctionSession {
        let rest = AuctionClient::with_base_url(base).expect("rest client");
        let live = LiveAuctionClient::new(WsConfig::default()).expect("live client");
        AuctionSession::mount("a1", rest, live, None).await
    }

    fn offline_session_parts() -> (AuctionClient, LiveAuctionClient) {
        (
            AuctionClient::with_base_url("http://127.0.0.1:9").expect("rest client"),
            LiveAuctionClient::with_url("ws://127.0.0.1:9").expect("live client"),
        )
    }

    fn snapshot(value: Value) -> AuctionSnapshot {
        AuctionSnapshot::from_value(value).expect("snapshot")
    }

    fn bid_event(amount: u64) -> LiveEvent {
        LiveEvent::Bid(BidRecord::new(
            Amount::from_units(amount),
            Some("bob".to_string()),
            None,
        ))
    }

    #[tokio::test]
    async fn test_mount_without_credential_has_no_channel() {
        let (rest, live) = offline_session_parts();
        let session = AuctionSession::mount("a1", rest, live, None).await;
        assert!(session.is_mounted());
        assert!(!session.has_live_channel());
        assert!(session.view().is_none());
    }

    #[tokio::test]
    async fn test_full_bidding_round() {
        let bids = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_api(api_router(Arc::clone(&bids))).await;
        let mut session = session(&base).await;

        let notices = session.load_snapshot().await;
        assert_eq!(
            notices,
            vec![Notice::Loaded {
                current_bid: Amount::from_units(100),
                status: AuctionStatus::Active,
            }]
        );
        let view = session.view().expect("view");
        assert_eq!(view.suggested_bid(), Amount::from_units(101));
        assert_eq!(view.title(), "Clock");

        session.submit_bid("150").await.expect("bid accepted");
        assert_eq!(bids.lock().expect("lock").len(), 1);
        assert_eq!(
            session.view().expect("view").current_bid(),
            Amount::from_units(100)
        );

        let notices = session.handle_event(bid_event(150));
        assert!(matches!(notices[0], Notice::NewBid { suggested, .. } if suggested == Amount::from_units(151)));
        assert_eq!(notices[1], Notice::CountdownStarted(10));
        assert_eq!(
            session.view().expect("view").current_bid(),
            Amount::from_units(150)
        );
        assert_eq!(session.countdown().seconds_remaining, Some(10));

        for _ in 0..9 {
            assert!(session.tick().is_empty());
        }
        assert_eq!(session.tick(), vec![Notice::Finalizing]);
        assert!(session.countdown().awaiting_finalization);

        let notices = session.handle_event(LiveEvent::Sold {
            winner: Some("bob".to_string()),
            final_price: Amount::from_units(150),
        });
        assert_eq!(
            notices,
            vec![Notice::Sold {
                winner: Some("bob".to_string()),
                final_price: Amount::from_units(150),
            }]
        );
        assert!(session.is_finished());
        assert!(!session.countdown().awaiting_finalization);
        assert!(!session.is_counting());

        let err = session.submit_bid("200").await.unwrap_err();
        assert!(matches!(err, BidError::Closed(AuctionStatus::Sold)));
        assert_eq!(bids.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_bid_surfaces_server_message() {
        let bids = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_api(api_router(Arc::clone(&bids))).await;
        let mut session = session(&base).await;
        session.load_snapshot().await;

        let err = session.submit_bid("5000").await.unwrap_err();
        assert!(matches!(err, BidError::Rejected(ref m) if m == "Insufficient balance"));
        assert_eq!(
            session.view().expect("view").current_bid(),
            Amount::from_units(100)
        );
    }

    #[tokio::test]
    async fn test_local_validation_sends_nothing() {
        let bids = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_api(api_router(Arc::clone(&bids))).await;
        let mut session = session(&base).await;
        session.load_snapshot().await;

        assert!(matches!(
            session.submit_bid("100").await,
            Err(BidError::TooLow { .. })
        ));
        assert!(matches!(
            session.submit_bid("abc").await,
            Err(BidError::InvalidAmount(_))
        ));
        assert!(bids.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;

        let notices = session.load_snapshot().await;
        assert!(matches!(notices[0], Notice::LoadFailed { retryable: true, .. }));
        assert!(session.view().is_none());
    }

    #[tokio::test]
    async fn test_events_before_snapshot_are_replayed() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;

        assert!(session.handle_event(bid_event(150)).is_empty());
        assert!(session.view().is_none());

        let notices = session.apply_snapshot_result(Ok(snapshot(json!({
            "currentPrice": "100",
            "status": "ACTIVE"
        }))));
        assert_eq!(
            notices,
            vec![
                Notice::Loaded {
                    current_bid: Amount::from_units(100),
                    status: AuctionStatus::Active,
                },
                Notice::CountdownStarted(10),
            ]
        );
        assert_eq!(
            session.view().expect("view").current_bid(),
            Amount::from_units(150)
        );
    }

    #[tokio::test]
    async fn test_sold_before_snapshot_keeps_winner_and_price() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;

        assert!(session
            .handle_event(LiveEvent::Sold {
                winner: Some("bob".to_string()),
                final_price: Amount::from_units(150),
            })
            .is_empty());

        let notices = session.apply_snapshot_result(Ok(snapshot(json!({
            "currentPrice": "100",
            "status": "ACTIVE"
        }))));
        assert_eq!(
            notices,
            vec![
                Notice::Loaded {
                    current_bid: Amount::from_units(100),
                    status: AuctionStatus::Active,
                },
                Notice::Sold {
                    winner: Some("bob".to_string()),
                    final_price: Amount::from_units(150),
                },
            ]
        );
        assert!(session.is_finished());
    }

    #[tokio::test]
    async fn test_ending_soon_leaves_countdown_running() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;
        session.apply_snapshot_result(Ok(snapshot(json!({ "currentPrice": 100 }))));
        session.handle_event(bid_event(120));

        for _ in 0..7 {
            assert!(session.tick().is_empty());
        }
        assert_eq!(
            session.handle_event(LiveEvent::EndingSoon(5)),
            vec![Notice::EndingSoon(5)]
        );

        let countdown = session.countdown();
        assert_eq!(countdown.seconds_remaining, Some(3));
        assert!(!countdown.awaiting_finalization);
        assert!(session.is_counting());
    }

    #[tokio::test]
    async fn test_connect_after_unmount_opens_nothing() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::new("a1", rest, live);
        assert!(session.is_mounted());
        assert!(!session.connect(None).await);

        session.unmount().await;
        assert!(!session.connect(Some("tok")).await);
        assert!(!session.has_live_channel());
    }

    #[tokio::test]
    async fn test_stale_snapshot_after_bid_keeps_price() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;
        session.apply_snapshot_result(Ok(snapshot(json!({ "currentPrice": 100 }))));
        session.handle_event(bid_event(150));

        session.handle_event(LiveEvent::Snapshot(snapshot(json!({ "currentPrice": 100 }))));
        assert_eq!(
            session.view().expect("view").current_bid(),
            Amount::from_units(150)
        );
    }

    #[tokio::test]
    async fn test_expired_after_sold_is_ignored() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;
        session.apply_snapshot_result(Ok(snapshot(json!({ "currentPrice": 100 }))));

        session.handle_event(LiveEvent::Sold {
            winner: None,
            final_price: Amount::from_units(100),
        });
        assert!(session.handle_event(LiveEvent::Expired).is_empty());
        assert_eq!(
            session.view().map(AuctionView::status),
            Some(AuctionStatus::Sold)
        );
    }

    #[tokio::test]
    async fn test_snapshot_reporting_closed_stops_countdown() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;
        session.apply_snapshot_result(Ok(snapshot(json!({ "currentPrice": 100 }))));
        session.handle_event(bid_event(120));
        assert!(session.is_counting());

        let notices = session.handle_event(LiveEvent::Snapshot(snapshot(json!({
            "currentPrice": 120,
            "status": "expired"
        }))));
        assert_eq!(notices, vec![Notice::Expired]);
        assert!(!session.is_counting());
        assert!(session.is_finished());
    }

    #[tokio::test]
    async fn test_passthrough_notices() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;

        assert_eq!(session.handle_event(LiveEvent::Connected), vec![Notice::Connected]);
        assert_eq!(
            session.handle_event(LiveEvent::ViewerCount(4)),
            vec![Notice::Viewers(4)]
        );
        let notices = session.handle_event(LiveEvent::EndingSoon(30));
        assert_eq!(notices[0].to_string(), "Auction ending in 30 seconds!");
        assert_eq!(
            session.handle_event(LiveEvent::Disconnected("reset".to_string())),
            vec![Notice::ConnectionLost("reset".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unmount_discards_late_results() {
        let (rest, live) = offline_session_parts();
        let mut session = AuctionSession::mount("a1", rest, live, None).await;
        session.apply_snapshot_result(Ok(snapshot(json!({ "currentPrice": 100 }))));
        session.handle_event(bid_event(120));

        session.unmount().await;
        session.unmount().await;
        assert!(!session.is_mounted());
        assert!(!session.is_counting());

        assert!(session.handle_event(bid_event(500)).is_empty());
        assert!(session
            .apply_snapshot_result(Ok(snapshot(json!({ "currentPrice": 900 }))))
            .is_empty());
        assert!(session.tick().is_empty());
        assert_eq!(
            session.view().expect("view").current_bid(),
            Amount::from_units(120)
        );
    }
}
