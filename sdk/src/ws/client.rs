//! WebSocket client implementation.
//!
//! [`LiveAuctionClient`] owns at most one [`LiveChannel`] at a time. Each
//! channel is scoped to a single auction room: it joins on connect, leaves on
//! close, and delivers that room's events through its own queue, so events
//! from a replaced channel can never reach the next one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::config::WsConfig;
use super::error::WsError;
use super::messages::{decode_event, ClientMessage, LiveEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Connection status of the live channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// True while the socket is up.
    pub connected: bool,
    /// Last viewer count pushed for this auction.
    pub viewer_count: u64,
}

/// One live connection scoped to one auction.
pub struct LiveChannel {
    auction_id: String,
    sink: Option<WsSink>,
    events: mpsc::Receiver<LiveEvent>,
    reader: Option<JoinHandle<()>>,
    state: Arc<RwLock<ConnectionState>>,
    close_timeout: Duration,
}

impl fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveChannel")
            .field("auction_id", &self.auction_id)
            .field("established", &self.sink.is_some())
            .finish()
    }
}

impl LiveChannel {
    /// Connects, authenticates with `token`, and joins the auction room.
    async fn connect(config: &WsConfig, auction_id: &str, token: &str) -> Result<Self, WsError> {
        let mut request = config.url.as_str().into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| WsError::InvalidCredential(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (ws_stream, _) =
            tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| {
                    WsError::Connection(format!(
                        "handshake timed out after {}ms",
                        config.connect_timeout.as_millis()
                    ))
                })?
                .map_err(|e| WsError::Connection(e.to_string()))?;

        let (mut sink, source) = ws_stream.split();
        info!("Connected to live server, joining auction room {}", auction_id);

        let join = ClientMessage::JoinAuction(auction_id.to_string()).to_frame()?;
        sink.send(Message::Text(join.into()))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))?;

        let state = Arc::new(RwLock::new(ConnectionState {
            connected: true,
            viewer_count: 0,
        }));
        let (event_tx, events) = mpsc::channel(config.event_channel_capacity.max(1));
        let _ = event_tx.try_send(LiveEvent::Connected);

        let reader = spawn_reader(
            source,
            auction_id.to_string(),
            event_tx,
            Arc::clone(&state),
        );

        Ok(Self {
            auction_id: auction_id.to_string(),
            sink: Some(sink),
            events,
            reader: Some(reader),
            state,
            close_timeout: config.close_timeout,
        })
    }

    /// A channel that never connected. Yields one `ConnectError` and ends.
    fn failed(config: &WsConfig, auction_id: &str, reason: String) -> Self {
        let (event_tx, events) = mpsc::channel(config.event_channel_capacity.max(1));
        let _ = event_tx.try_send(LiveEvent::ConnectError(reason));

        Self {
            auction_id: auction_id.to_string(),
            sink: None,
            events,
            reader: None,
            state: Arc::new(RwLock::new(ConnectionState::default())),
            close_timeout: config.close_timeout,
        }
    }

    /// Returns the auction this channel is scoped to.
    #[must_use]
    pub fn auction_id(&self) -> &str {
        &self.auction_id
    }

    /// Returns true if the socket was established.
    #[must_use]
    pub fn is_established(&self) -> bool {
        self.sink.is_some()
    }

    /// Returns the current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Returns the next event, or `None` once the channel has ended.
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }

    /// Leaves the room, closes the socket, and drops every undelivered event.
    pub async fn close(mut self) {
        if let Some(mut sink) = self.sink.take() {
            let leave = ClientMessage::LeaveAuction(self.auction_id.clone());
            debug!("Leaving auction room {}", self.auction_id);

            let shutdown = async {
                let frame = leave.to_frame()?;
                sink.send(Message::Text(frame.into()))
                    .await
                    .map_err(|e| WsError::SendFailed(e.to_string()))?;
                sink.close()
                    .await
                    .map_err(|e| WsError::SendFailed(e.to_string()))
            };

            match tokio::time::timeout(self.close_timeout, shutdown).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Live channel {} closed uncleanly: {}", self.auction_id, e),
                Err(_) => warn!("Timed out closing live channel {}", self.auction_id),
            }
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.state.write().await.connected = false;

        self.events.close();
        while self.events.try_recv().is_ok() {}

        info!("Live channel for auction {} closed", self.auction_id);
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Spawns the task that turns inbound frames into events.
///
/// Every frame is logged at debug level before decoding; that log is purely
/// diagnostic.
fn spawn_reader(
    mut source: WsSource,
    auction_id: String,
    event_tx: mpsc::Sender<LiveEvent>,
    state: Arc<RwLock<ConnectionState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => {
                    debug!(auction = %auction_id, "live frame: {}", text.as_str());

                    match decode_event(&text, &auction_id) {
                        Ok(Some(event)) => {
                            if let LiveEvent::ViewerCount(count) = &event {
                                state.write().await.viewer_count = *count;
                            }
                            if event_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => debug!(auction = %auction_id, "ignoring live frame"),
                        Err(e) => warn!(auction = %auction_id, "dropping malformed live frame: {}", e),
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| f.reason.as_str().to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_string(),
            }
        };

        state.write().await.connected = false;
        warn!("Live channel for auction {} disconnected: {}", auction_id, reason);
        let _ = event_tx.send(LiveEvent::Disconnected(reason)).await;
    })
}

/// Live connection manager.
///
/// Keeps exactly one channel per mounted auction view. No automatic
/// reconnection: `Disconnected` and `ConnectError` are surfaced and the caller
/// decides whether to call [`LiveAuctionClient::open`] again.
#[derive(Debug)]
pub struct LiveAuctionClient {
    config: WsConfig,
    channel: Option<LiveChannel>,
}

impl LiveAuctionClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WsConfig) -> Result<Self, WsError> {
        config.validate()?;
        Ok(Self {
            config,
            channel: None,
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_defaults() -> Result<Self, WsError> {
        Self::new(WsConfig::default())
    }

    /// Creates a new client with the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_url(url: impl Into<String>) -> Result<Self, WsError> {
        Self::new(WsConfig::new(url))
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Opens the live channel for `auction_id`.
    ///
    /// Any previous channel is fully closed first, whether or not a new one
    /// is opened. Without a credential nothing is opened and `false` is
    /// returned; the auction can still be read over REST. A failed or timed
    /// out connection leaves a channel that yields a single `ConnectError`
    /// event.
    pub async fn open(&mut self, auction_id: &str, credential: Option<&str>) -> bool {
        self.close().await;

        let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) else {
            warn!("No credential available, live updates disabled for auction {}", auction_id);
            return false;
        };

        match LiveChannel::connect(&self.config, auction_id, token).await {
            Ok(channel) => {
                self.channel = Some(channel);
                true
            }
            Err(e) => {
                error!("Live connection for auction {} failed: {}", auction_id, e);
                self.channel = Some(LiveChannel::failed(&self.config, auction_id, e.to_string()));
                false
            }
        }
    }

    /// Returns the current channel, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&LiveChannel> {
        self.channel.as_ref()
    }

    /// Returns true if a channel (live or failed) is held.
    #[must_use]
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Returns the connection state, or the default when no channel is held.
    pub async fn connection_state(&self) -> ConnectionState {
        match &self.channel {
            Some(channel) => channel.state().await,
            None => ConnectionState::default(),
        }
    }

    /// Returns the next event from the current channel.
    ///
    /// Returns `None` when there is no channel or the channel has ended.
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        match self.channel.as_mut() {
            Some(channel) => channel.next_event().await,
            None => None,
        }
    }

    /// Closes the current channel, if any.
    pub async fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Amount;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[derive(Debug, Default)]
    struct Recorded {
        auth: Option<String>,
        frames: Vec<String>,
    }

    /// Accepts `connections` clients one after another. For each: records the
    /// join frame, pushes `script`, then either closes from the server side or
    /// records frames until the client closes.
    async fn spawn_room(
        connections: usize,
        script: Vec<Value>,
        server_closes: bool,
    ) -> (String, JoinHandle<Vec<Recorded>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let mut recorded = Vec::new();
            for _ in 0..connections {
                let (stream, _) = listener.accept().await.expect("accept");
                let (auth_tx, auth_rx) = tokio::sync::oneshot::channel();
                let mut ws = tokio_tungstenite::accept_hdr_async(
                    stream,
                    move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                        let auth = req
                            .headers()
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        let _ = auth_tx.send(auth);
                        Ok(resp)
                    },
                )
                .await
                .expect("handshake");

                let mut rec = Recorded {
                    auth: auth_rx.await.ok().flatten(),
                    frames: Vec::new(),
                };

                if let Some(Ok(Message::Text(join))) = ws.next().await {
                    rec.frames.push(join.as_str().to_string());
                }

                for frame in &script {
                    ws.send(Message::Text(frame.to_string().into()))
                        .await
                        .expect("send");
                }

                if server_closes {
                    let _ = ws.close(None).await;
                    while ws.next().await.is_some() {}
                } else {
                    while let Some(Ok(msg)) = ws.next().await {
                        match msg {
                            Message::Text(text) => rec.frames.push(text.as_str().to_string()),
                            Message::Close(_) => break,
                            _ => {}
                        }
                    }
                }
                recorded.push(rec);
            }
            recorded
        });

        (format!("ws://{}", addr), handle)
    }

    async fn next(client: &mut LiveAuctionClient) -> Option<LiveEvent> {
        tokio::time::timeout(Duration::from_secs(5), client.next_event())
            .await
            .expect("event in time")
    }

    #[test]
    fn test_client_new() {
        assert!(LiveAuctionClient::with_url("wss://example.com/live").is_ok());
        assert!(LiveAuctionClient::with_defaults().is_ok());
    }

    #[test]
    fn test_client_invalid_config() {
        assert!(LiveAuctionClient::new(WsConfig::new("")).is_err());
    }

    #[tokio::test]
    async fn test_open_without_credential_opens_nothing() {
        let mut client = LiveAuctionClient::with_url("ws://127.0.0.1:9").expect("client");

        assert!(!client.open("a1", None).await);
        assert!(!client.open("a1", Some("   ")).await);
        assert!(!client.has_channel());
        assert!(next(&mut client).await.is_none());
        assert!(!client.connection_state().await.connected);
    }

    #[tokio::test]
    async fn test_connect_error_is_surfaced_as_event() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let mut client = LiveAuctionClient::with_url(format!("ws://{}", addr)).expect("client");
        assert!(!client.open("a1", Some("tok")).await);

        assert!(matches!(next(&mut client).await, Some(LiveEvent::ConnectError(_))));
        assert!(next(&mut client).await.is_none());
    }

    #[tokio::test]
    async fn test_join_events_and_leave() {
        let script = vec![
            json!({ "event": "NEW_BID", "data": { "amount": 150, "bidderName": "alice" } }),
            json!({ "event": "VIEWER_COUNT", "data": { "auctionId": "a2", "count": 99 } }),
            json!({ "event": "VIEWER_COUNT", "data": { "auctionId": "a1", "count": 7 } }),
            json!({ "event": "AUCTION_SOLD", "data": { "winnerName": "alice", "finalPrice": 150 } }),
        ];
        let (url, server) = spawn_room(1, script, false).await;
        let mut client = LiveAuctionClient::with_url(url).expect("client");

        assert!(client.open("a1", Some("secret")).await);
        assert_eq!(next(&mut client).await, Some(LiveEvent::Connected));

        match next(&mut client).await {
            Some(LiveEvent::Bid(bid)) => assert_eq!(bid.amount, Amount::from_units(150)),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(next(&mut client).await, Some(LiveEvent::ViewerCount(7)));
        assert!(matches!(next(&mut client).await, Some(LiveEvent::Sold { .. })));

        let state = client.connection_state().await;
        assert!(state.connected);
        assert_eq!(state.viewer_count, 7);

        client.close().await;
        assert!(!client.has_channel());

        let recorded = server.await.expect("server");
        assert_eq!(recorded[0].auth.as_deref(), Some("Bearer secret"));
        assert_eq!(
            recorded[0].frames,
            vec![
                r#"{"event":"joinAuction","data":"a1"}"#.to_string(),
                r#"{"event":"leaveAuction","data":"a1"}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_server_close_surfaces_disconnected() {
        let (url, server) = spawn_room(1, Vec::new(), true).await;
        let mut client = LiveAuctionClient::with_url(url).expect("client");

        assert!(client.open("a1", Some("tok")).await);
        assert_eq!(next(&mut client).await, Some(LiveEvent::Connected));
        assert!(matches!(next(&mut client).await, Some(LiveEvent::Disconnected(_))));
        assert!(!client.connection_state().await.connected);

        client.close().await;
        let _ = server.await;
    }

    #[tokio::test]
    async fn test_reopen_closes_previous_channel_first() {
        let (url, server) = spawn_room(2, Vec::new(), false).await;
        let mut client = LiveAuctionClient::with_url(url).expect("client");

        assert!(client.open("a1", Some("tok")).await);
        assert!(client.open("a2", Some("tok")).await);
        assert_eq!(client.channel().map(LiveChannel::auction_id), Some("a2"));
        assert_eq!(next(&mut client).await, Some(LiveEvent::Connected));

        client.close().await;

        let recorded = server.await.expect("server");
        assert_eq!(recorded.len(), 2);
        assert_eq!(
            recorded[0].frames,
            vec![
                r#"{"event":"joinAuction","data":"a1"}"#.to_string(),
                r#"{"event":"leaveAuction","data":"a1"}"#.to_string(),
            ]
        );
        assert_eq!(
            recorded[1].frames.first().map(String::as_str),
            Some(r#"{"event":"joinAuction","data":"a2"}"#)
        );
    }

    #[tokio::test]
    async fn test_reopen_without_credential_still_closes_previous_channel() {
        let script = vec![json!({ "event": "NEW_BID", "data": { "amount": 999 } })];
        let (url, server) = spawn_room(1, script, false).await;
        let mut client = LiveAuctionClient::with_url(url).expect("client");

        assert!(client.open("a1", Some("tok")).await);
        assert!(!client.open("a2", None).await);

        assert!(!client.has_channel());
        assert!(client.channel().is_none());
        assert!(next(&mut client).await.is_none());
        assert!(!client.connection_state().await.connected);

        let recorded = server.await.expect("server");
        assert_eq!(
            recorded[0].frames,
            vec![
                r#"{"event":"joinAuction","data":"a1"}"#.to_string(),
                r#"{"event":"leaveAuction","data":"a1"}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out_as_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let stall = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let config = WsConfig::new(format!("ws://{}", addr))
            .with_connect_timeout(Duration::from_millis(200));
        let mut client = LiveAuctionClient::new(config).expect("client");

        let opened = tokio::time::timeout(Duration::from_secs(5), client.open("a1", Some("tok")))
            .await
            .expect("open returns within the connect timeout");
        assert!(!opened);

        match next(&mut client).await {
            Some(LiveEvent::ConnectError(reason)) => assert!(reason.contains("timed out")),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(next(&mut client).await.is_none());
        stall.abort();
    }
}
