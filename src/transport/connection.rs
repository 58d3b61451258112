//! WebSocket connection and event loop.
//!
//! This module handles one WebSocket connection to the remote client.
//!
//! # Event Loop
//!
//! Each connection spawns a tokio task that handles:
//!
//! - Incoming text frames, forwarded to the [`EventRegistry`]
//! - Outgoing frames queued by [`Connection::send_text`]
//! - Shutdown requests (replacement or bridge stop)
//!
//! When the loop exits for any reason it detaches itself from the registry,
//! so `is_connected()` turns false without anyone polling the socket.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use super::EventRegistry;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a text frame.
    Send(String),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to a live WebSocket connection.
///
/// Cloning the handle does not duplicate the connection.
#[derive(Clone)]
pub struct Connection {
    /// Bridge-local connection number.
    id: u64,
    /// Remote address, when known.
    peer: Option<SocketAddr>,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl Connection {
    /// Spawns the event loop for an upgraded stream and returns its handle.
    pub(crate) fn spawn<S>(
        id: u64,
        peer: Option<SocketAddr>,
        ws_stream: WebSocketStream<S>,
        registry: EventRegistry,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(id, ws_stream, command_rx, registry));

        Self {
            id,
            peer,
            command_tx,
        }
    }

    /// Returns the connection number.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the remote address, if known.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Returns `true` while the event loop is running.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Queues a text frame.
    ///
    /// Returns `false` if the event loop has already stopped.
    pub fn send_text(&self, text: String) -> bool {
        self.command_tx.send(ConnectionCommand::Send(text)).is_ok()
    }

    /// Asks the event loop to close the socket.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        id: u64,
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        registry: EventRegistry,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the remote client
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            registry.on_message(text.as_str());
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(connection = id, "WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            warn!(connection = id, error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!(connection = id, "WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong, Frame
                        _ => {}
                    }
                }

                // Commands from the bridge
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                warn!(connection = id, error = %e, "Failed to send frame");
                                break;
                            }
                            trace!(connection = id, "Frame sent");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!(connection = id, "Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!(connection = id, "Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        command_rx.close();
        registry.detach(id);

        debug!(connection = id, "Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================
