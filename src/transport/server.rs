//! Bridge server: listener, port retry, and connection replacement.
//!
//! # Connection Flow
//!
//! 1. [`BridgeServer::start`] binds `base_port`, walking up one port at a time
//!    while ports are in use
//! 2. The reviewed page loads the panel, which opens a WebSocket to the port
//! 3. Each accepted WebSocket replaces the previous connection
//! 4. [`BridgeServer::stop`] discards waits, closes the connection and
//!    releases the listener
//!
//! # State Machine
//!
//! ```text
//! Idle → Binding → Listening ⇄ Connected
//!   └───────┴──────────┴──────────┴──→ Stopped
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::io::{Error as IoError, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{Envelope, ServerMessage};

use super::{BridgeOptions, Connection, EventRegistry};

// ============================================================================
// Constants
// ============================================================================

/// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Deadline for a TCP client to complete the WebSocket upgrade.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Path of the instructions page served next to the panel.
const INSTRUCTIONS_PATH: &str = "bookmarklet";

// ============================================================================
// BridgeState
// ============================================================================

/// Lifecycle state of a [`BridgeServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Created, not started.
    Idle,
    /// Trying ports.
    Binding,
    /// Bound, no client attached.
    Listening,
    /// Bound, client attached.
    Connected,
    /// Shut down. Terminal.
    Stopped,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Binding => "binding",
            Self::Listening => "listening",
            Self::Connected => "connected",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ============================================================================
// BridgeInfo
// ============================================================================

/// Where the bridge ended up listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeInfo {
    /// Bound port.
    pub port: u16,
    /// `http://localhost:{port}`.
    pub base_url: String,
    /// Instructions page for injecting the panel.
    pub instructions_url: String,
}

impl BridgeInfo {
    fn for_port(port: u16) -> Result<Self> {
        let base_url = format!("http://localhost:{port}");
        let instructions_url = url::Url::parse(&base_url)
            .and_then(|base| base.join(INSTRUCTIONS_PATH))
            .map_err(|e| Error::config(format!("Invalid bridge URL {base_url}: {e}")))?
            .to_string();

        Ok(Self {
            port,
            base_url,
            instructions_url,
        })
    }

    /// Returns the WebSocket URL the panel connects to.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://localhost:{}", self.port)
    }
}

// ============================================================================
// BridgeServer
// ============================================================================

/// Local server owning one listener and at most one client connection.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use feedback_copilot::transport::{BridgeOptions, BridgeServer};
///
/// # async fn example() -> feedback_copilot::Result<()> {
/// let bridge = BridgeServer::new(BridgeOptions::default());
/// let info = bridge.start().await?;
/// println!("open {}", info.instructions_url);
///
/// let transcript = bridge
///     .request("listen_start", serde_json::json!({}), "user_speech", Duration::from_secs(60))
///     .await?;
/// println!("user said {transcript}");
///
/// bridge.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct BridgeServer {
    inner: Arc<BridgeInner>,
}

/// Shared state for the bridge.
struct BridgeInner {
    /// Bind and timeout settings.
    options: BridgeOptions,
    /// Waiters and current connection.
    registry: EventRegistry,
    /// Lifecycle state (never `Connected`; derived on read).
    state: Mutex<BridgeState>,
    /// Set after a successful bind.
    info: Mutex<Option<BridgeInfo>>,
    /// Accept loop stop flag.
    shutdown: Arc<AtomicBool>,
    /// Accept loop task.
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for BridgeInner {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(task) = self.accept_task.get_mut().take() {
            task.abort();
        }
        self.registry.close();
    }
}

impl fmt::Debug for BridgeServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeServer")
            .field("state", &self.state())
            .field("info", &self.info())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BridgeServer - Lifecycle
// ============================================================================

impl BridgeServer {
    /// Creates an idle bridge.
    #[must_use]
    pub fn new(options: BridgeOptions) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                options,
                registry: EventRegistry::new(),
                state: Mutex::new(BridgeState::Idle),
                info: Mutex::new(None),
                shutdown: Arc::new(AtomicBool::new(false)),
                accept_task: Mutex::new(None),
            }),
        }
    }

    /// Binds the listener and starts accepting connections.
    ///
    /// On bind failure the bridge returns to `Idle` holding no socket.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the bridge is not idle
    /// - [`Error::BindExhausted`] if every port in the window is in use
    /// - [`Error::Io`] for any other bind error
    pub async fn start(&self) -> Result<BridgeInfo> {
        self.transition(BridgeState::Idle, BridgeState::Binding)?;

        let (listener, info) = match bind(&self.inner.options).await {
            Ok(bound) => bound,
            Err(e) => {
                let _ = self.transition(BridgeState::Binding, BridgeState::Idle);
                return Err(e);
            }
        };
        let port = info.port;

        // stop() may have raced the bind; the listener is dropped here if so.
        self.transition(BridgeState::Binding, BridgeState::Listening)?;
        *self.inner.info.lock() = Some(info.clone());

        let task = tokio::spawn(accept_loop(
            listener,
            self.inner.registry.clone(),
            Arc::clone(&self.inner.shutdown),
        ));
        *self.inner.accept_task.lock() = Some(task);

        info!(port, url = %info.base_url, "Bridge listening");

        Ok(info)
    }

    /// Shuts the bridge down.
    ///
    /// Pending waits are discarded, the connection is closed and the listener
    /// is released before this returns. Calling it again is a no-op.
    pub async fn stop(&self) {
        let previous = std::mem::replace(&mut *self.inner.state.lock(), BridgeState::Stopped);
        if previous == BridgeState::Stopped {
            return;
        }

        self.inner.registry.close();
        self.inner.shutdown.store(true, Ordering::SeqCst);

        let task = self.inner.accept_task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            debug!(error = %e, "Accept loop ended abnormally");
        }

        info!(?previous, "Bridge stopped");
    }

    /// Moves from `from` to `to`, failing if the current state is not `from`.
    fn transition(&self, from: BridgeState, to: BridgeState) -> Result<()> {
        let mut state = self.inner.state.lock();
        if *state != from {
            return Err(Error::invalid_state(format!(
                "bridge is {}, expected {from}",
                *state
            )));
        }
        *state = to;
        Ok(())
    }
}

// ============================================================================
// BridgeServer - Public API
// ============================================================================

impl BridgeServer {
    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        match *self.inner.state.lock() {
            BridgeState::Listening if self.inner.registry.is_connected() => BridgeState::Connected,
            state => state,
        }
    }

    /// Returns the bound address details once started.
    #[must_use]
    pub fn info(&self) -> Option<BridgeInfo> {
        self.inner.info.lock().clone()
    }

    /// Returns the bound port once started.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.inner.info.lock().as_ref().map(|info| info.port)
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.inner.options
    }

    /// Returns the correlation registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &EventRegistry {
        &self.inner.registry
    }

    /// Returns `true` if a client is attached and ready.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.registry.is_connected()
    }

    /// Sends `{event, data}` to the client. No-op without a client.
    pub fn send(&self, event: impl Into<String>, data: Value) {
        self.inner.registry.send(&Envelope::new(event, data));
    }

    /// Sends a typed message to the client. No-op without a client.
    pub fn send_message(&self, message: &ServerMessage) {
        match message.encode() {
            Ok(text) => self.inner.registry.send_text(text),
            Err(e) => warn!(event = message.event_name(), error = %e, "Failed to encode message"),
        }
    }

    /// Waits for the next `event` frame.
    ///
    /// The wait is registered when this is called, not when awaited.
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::Timeout`] after `timeout`.
    pub fn wait_for_event(
        &self,
        event: impl Into<String>,
        timeout: Duration,
    ) -> impl Future<Output = Result<Value>> + Send + 'static {
        self.inner.registry.wait_for_event(event, timeout)
    }

    /// Waits for the next `event` frame using the configured default timeout.
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::Timeout`] after the default timeout.
    pub fn wait_for(
        &self,
        event: impl Into<String>,
    ) -> impl Future<Output = Result<Value>> + Send + 'static {
        self.wait_for_event(event, self.inner.options.event_timeout)
    }

    /// Registers a wait for `reply`, then sends `{event, data}`.
    ///
    /// The reply cannot slip in between send and registration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if `reply` does not arrive in time.
    pub async fn request(
        &self,
        event: impl Into<String>,
        data: Value,
        reply: impl Into<String>,
        timeout: Duration,
    ) -> Result<Value> {
        let wait = self.wait_for_event(reply, timeout);
        self.send(event, data);
        wait.await
    }

    /// Typed variant of [`request`](Self::request).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if `reply` does not arrive in time.
    pub async fn request_message(
        &self,
        message: &ServerMessage,
        reply: impl Into<String>,
        timeout: Duration,
    ) -> Result<Value> {
        let wait = self.wait_for_event(reply, timeout);
        self.send_message(message);
        wait.await
    }
}

// ============================================================================
// Binding
// ============================================================================

/// Binds the listener and derives the public URLs.
async fn bind(options: &BridgeOptions) -> Result<(TcpListener, BridgeInfo)> {
    let listener = bind_with_retry(options).await?;
    let port = listener.local_addr()?.port();
    let info = BridgeInfo::for_port(port)?;
    Ok((listener, info))
}

/// Binds the first free port in `base_port..=last_port`.
async fn bind_with_retry(options: &BridgeOptions) -> Result<TcpListener> {
    let start_port = options.base_port;
    let last_port = options.last_port();
    let mut port = start_port;

    loop {
        let addr = SocketAddr::new(options.bind_ip, port);

        match TcpListener::bind(addr).await {
            Ok(listener) => {
                debug!(port, "Bridge listener bound");
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                if port >= last_port {
                    error!(start_port, last_port, "No free port in range");
                    return Err(Error::bind_exhausted(start_port, port));
                }
                warn!(port, next = port + 1, "Port in use, trying next");
                port += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ============================================================================
// Accept Loop
// ============================================================================

/// Background task that accepts and upgrades connections.
///
/// Upgrades run in a [`JoinSet`] owned by the loop and are aborted when it
/// exits, so no half-open socket outlives the bridge.
async fn accept_loop(listener: TcpListener, registry: EventRegistry, shutdown: Arc<AtomicBool>) {
    debug!("Accept loop started");

    let mut next_id: u64 = 1;
    let mut upgrades = JoinSet::new();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            debug!("Accept loop shutting down");
            break;
        }

        while upgrades.try_join_next().is_some() {}

        // Accept with timeout to allow checking shutdown flag
        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, addr))) => {
                let registry = registry.clone();
                let id = next_id;
                next_id += 1;
                upgrades.spawn(async move {
                    if let Err(e) = handle_connection(id, stream, addr, registry).await {
                        warn!(error = %e, ?addr, "Connection handling failed");
                    }
                });
            }
            Ok(Err(e)) => {
                error!(error = %e, "Accept failed");
            }
            Err(_) => continue,
        }
    }

    let pending = upgrades.len();
    upgrades.shutdown().await;

    debug!(pending, "Accept loop terminated");
}

/// Upgrades one TCP connection and installs it as the current connection.
async fn handle_connection(
    id: u64,
    stream: TcpStream,
    addr: SocketAddr,
    registry: EventRegistry,
) -> Result<()> {
    debug!(?addr, "New TCP connection");

    let ws_stream = timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::accept_async(stream))
        .await
        .map_err(|_| {
            IoError::new(
                ErrorKind::TimedOut,
                format!("WebSocket handshake not completed within {HANDSHAKE_TIMEOUT:?}"),
            )
        })??;

    info!(connection = id, ?addr, "Panel connected");

    registry.attach(Connection::spawn(id, Some(addr), ws_stream, registry.clone()));

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    fn ephemeral() -> BridgeOptions {
        BridgeOptions::new().with_base_port(0)
    }

    async fn free_port() -> u16 {
        let probe = TcpListener::bind("127.0.0.1:0").await.expect("probe bind");
        probe.local_addr().expect("addr").port()
    }

    async fn connect(bridge: &BridgeServer) -> Client {
        let port = bridge.port().expect("started");
        let (client, _) = connect_async(format!("ws://127.0.0.1:{port}"))
            .await
            .expect("client connect");
        client
    }

    async fn until(mut condition: impl FnMut() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition reached");
    }

    async fn next_envelope(client: &mut Client) -> Envelope {
        loop {
            let frame = timeout(Duration::from_secs(5), client.next())
                .await
                .expect("frame in time")
                .expect("stream open")
                .expect("frame ok");
            if let Message::Text(text) = frame {
                return Envelope::decode(text.as_str()).expect("envelope");
            }
        }
    }

    #[tokio::test]
    async fn test_start_reports_urls() {
        let bridge = BridgeServer::new(ephemeral());
        assert_eq!(bridge.state(), BridgeState::Idle);

        let info = bridge.start().await.expect("start");
        assert!(info.port > 0);
        assert_eq!(info.base_url, format!("http://localhost:{}", info.port));
        assert_eq!(
            info.instructions_url,
            format!("http://localhost:{}/bookmarklet", info.port)
        );
        assert_eq!(info.ws_url(), format!("ws://localhost:{}", info.port));
        assert_eq!(bridge.state(), BridgeState::Listening);
        assert_eq!(bridge.info(), Some(info));

        bridge.stop().await;
        assert_eq!(bridge.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_binds_base_port_when_free() {
        let port = free_port().await;
        let bridge = BridgeServer::new(BridgeOptions::new().with_base_port(port));

        // May race with another process grabbing the port; only the
        // success path is asserted.
        if let Ok(info) = bridge.start().await {
            assert_eq!(info.port, port);
        }
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_skips_occupied_port() {
        let blocker = TcpListener::bind("127.0.0.1:0").await.expect("blocker");
        let base = blocker.local_addr().expect("addr").port();

        let bridge = BridgeServer::new(BridgeOptions::new().with_base_port(base));
        match bridge.start().await {
            Ok(info) => {
                assert!(info.port > base);
                assert!(info.port - base < 10);
            }
            Err(e) => assert!(matches!(e, Error::BindExhausted { .. })),
        }
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_exhausted_range_fails_without_leaking() {
        let first = TcpListener::bind("127.0.0.1:0").await.expect("blocker");
        let base = first.local_addr().expect("addr").port();
        let retries = 3u16;

        // Ports we cannot bind are held by someone else, which is just as
        // occupied.
        let mut blockers = vec![first];
        for port in base + 1..base + retries {
            if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)).await {
                blockers.push(listener);
            }
        }

        let bridge =
            BridgeServer::new(BridgeOptions::new().with_base_port(base).with_max_retries(retries));
        let err = bridge.start().await.unwrap_err();

        match err {
            Error::BindExhausted {
                start_port,
                end_port,
                attempts,
            } => {
                assert_eq!(start_port, base);
                assert_eq!(end_port, base + retries - 1);
                assert_eq!(attempts, retries);
            }
            other => panic!("expected BindExhausted, got {other:?}"),
        }
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert!(bridge.info().is_none());

        // No socket was left open: once the blockers go away the base port
        // can be bound again.
        drop(blockers);
        assert!(TcpListener::bind(("127.0.0.1", base)).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");

        let err = bridge.start().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        bridge.stop().await;
        let err = bridge.start().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_stop_releases_listener() {
        let bridge = BridgeServer::new(ephemeral());
        let info = bridge.start().await.expect("start");

        bridge.stop().await;
        bridge.stop().await;

        assert!(TcpListener::bind(("127.0.0.1", info.port)).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_before_connect_is_silent_then_observed() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");

        assert!(!bridge.is_connected());
        bridge.send("speak", json!({ "message": "nobody hears this" }));

        let mut client = connect(&bridge).await;
        until(|| bridge.is_connected()).await;
        assert_eq!(bridge.state(), BridgeState::Connected);

        bridge.send("speak", json!({ "message": "hello" }));
        let envelope = next_envelope(&mut client).await;
        assert_eq!(envelope.event, "speak");
        assert_eq!(envelope.get_string("message"), "hello");

        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");
        let mut client = connect(&bridge).await;
        until(|| bridge.is_connected()).await;

        let responder = tokio::spawn(async move {
            let prompt = next_envelope(&mut client).await;
            assert_eq!(prompt.event, "listen_start");
            client
                .send(Message::Text(
                    r#"{"event":"user_speech","data":"the footer overlaps"}"#.to_string().into(),
                ))
                .await
                .expect("reply");
            client
        });

        let transcript = bridge
            .request_message(&ServerMessage::ListenStart {}, "user_speech", Duration::from_secs(5))
            .await
            .expect("transcript");
        assert_eq!(transcript, json!("the footer overlaps"));

        let _client = responder.await.expect("responder");
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_new_connection_replaces_old() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");

        let mut first = connect(&bridge).await;
        until(|| bridge.is_connected()).await;

        let mut second = connect(&bridge).await;

        // The first client is closed once the second is installed.
        let closed = timeout(Duration::from_secs(5), async {
            loop {
                match first.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        })
        .await;
        assert!(closed.is_ok());

        until(|| bridge.is_connected()).await;
        bridge.send("show_overlay", json!({}));
        assert_eq!(next_envelope(&mut second).await.event, "show_overlay");

        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_client_disconnect_clears_connection() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");

        let mut client = connect(&bridge).await;
        until(|| bridge.is_connected()).await;

        client.close(None).await.expect("close");
        until(|| !bridge.is_connected()).await;
        assert_eq!(bridge.state(), BridgeState::Listening);

        bridge.send("speak", json!({ "message": "into the void" }));
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_frames_are_ignored() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");
        let mut client = connect(&bridge).await;
        until(|| bridge.is_connected()).await;

        let wait = bridge.wait_for_event("drawing_complete", Duration::from_secs(5));

        client
            .send(Message::Text("{{{ not json".to_string().into()))
            .await
            .expect("garbage");
        client
            .send(Message::Binary(vec![1u8, 2, 3].into()))
            .await
            .expect("binary");
        client
            .send(Message::Text(
                r#"{"event":"drawing_complete","data":"data:image/png;base64,AA=="}"#
                    .to_string()
                    .into(),
            ))
            .await
            .expect("drawing");

        assert_eq!(wait.await.expect("drawing"), json!("data:image/png;base64,AA=="));
        assert!(bridge.is_connected());

        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_stop_closes_client() {
        let bridge = BridgeServer::new(ephemeral());
        bridge.start().await.expect("start");
        let mut client = connect(&bridge).await;
        until(|| bridge.is_connected()).await;

        let _pending = bridge.wait_for_event("user_speech", Duration::from_secs(60));
        bridge.stop().await;

        assert_eq!(bridge.registry().pending_count(), 0);
        assert!(!bridge.is_connected());

        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("client notified");
        assert!(matches!(frame, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    }

    #[tokio::test]
    async fn test_non_websocket_request_is_dropped() {
        use tokio::io::AsyncWriteExt;

        let bridge = BridgeServer::new(ephemeral());
        let info = bridge.start().await.expect("start");

        let mut raw = TcpStream::connect(("127.0.0.1", info.port)).await.expect("tcp");
        raw.write_all(b"GET /overlay.js HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .expect("write");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!bridge.is_connected());
        assert_eq!(bridge.state(), BridgeState::Listening);

        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_silent_client_released_on_stop() {
        use tokio::io::AsyncReadExt;

        let bridge = BridgeServer::new(ephemeral());
        let info = bridge.start().await.expect("start");

        // Connects but never sends the upgrade request.
        let mut raw = TcpStream::connect(("127.0.0.1", info.port)).await.expect("tcp");
        tokio::time::sleep(Duration::from_millis(200)).await;

        bridge.stop().await;

        let mut buf = [0u8; 16];
        let read = timeout(Duration::from_secs(2), raw.read(&mut buf))
            .await
            .expect("socket closed after stop");
        assert!(matches!(read, Ok(0) | Err(_)));
    }
}
