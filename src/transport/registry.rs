//! Event correlation registry.
//!
//! Turns the connection's unordered inbound frames into named,
//! timeout-bound waits.
//!
//! # Rules
//!
//! - At most one waiter per event name. A second registration for the same
//!   name supersedes the first; the superseded waiter is never resolved and
//!   fails with [`Error::Timeout`] when its own deadline passes.
//! - A frame that arrives while nobody waits for its name is dropped.
//! - Malformed frames are logged and dropped.
//! - Waiter map and connection handle share one lock, so a wait registered
//!   before a prompt is sent cannot miss the reply.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Envelope;

use super::Connection;

// ============================================================================
// Types
// ============================================================================

/// A registered wait for one event name.
struct PendingWait {
    /// Identifies the registration that owns the entry.
    token: u64,
    /// Resolution channel.
    tx: oneshot::Sender<Value>,
}

/// State guarded by the registry lock.
#[derive(Default)]
struct RegistryState {
    /// Waiters keyed by event name.
    waiters: FxHashMap<String, PendingWait>,
    /// Current connection, if any.
    connection: Option<Connection>,
    /// Token for the next registration.
    next_token: u64,
    /// Set once by [`EventRegistry::close`].
    closed: bool,
}

// ============================================================================
// EventRegistry
// ============================================================================

/// Maps event names to pending waiters and owns the live connection handle.
///
/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct EventRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// EventRegistry - Outbound
// ============================================================================

impl EventRegistry {
    /// Sends an envelope to the current connection.
    ///
    /// Silently dropped when no connection is open.
    pub fn send(&self, envelope: &Envelope) {
        match envelope.encode() {
            Ok(text) => self.send_text(text),
            Err(e) => warn!(event = %envelope.event, error = %e, "Failed to encode envelope"),
        }
    }

    /// Sends a pre-encoded text frame to the current connection.
    ///
    /// Silently dropped when no connection is open.
    pub fn send_text(&self, text: String) {
        let state = self.state.lock();

        match state.connection.as_ref() {
            Some(connection) if connection.send_text(text) => {}
            Some(connection) => {
                trace!(connection = connection.id(), "Connection not ready, frame dropped");
            }
            None => trace!("No connection, frame dropped"),
        }
    }

    /// Returns `true` if a connection is attached and still running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .connection
            .as_ref()
            .is_some_and(Connection::is_open)
    }
}

// ============================================================================
// EventRegistry - Waiting
// ============================================================================

impl EventRegistry {
    /// Registers a wait for `event` and returns a future for its payload.
    ///
    /// Registration happens immediately, before the future is polled, and the
    /// deadline counts from this call.
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::Timeout`] if no matching frame arrives
    /// before `timeout`, including when this wait was superseded or the
    /// registry was closed.
    pub fn wait_for_event(
        &self,
        event: impl Into<String>,
        timeout: Duration,
    ) -> impl Future<Output = Result<Value>> + Send + 'static {
        let event = event.into();
        let deadline = deadline_after(timeout);
        let (tx, rx) = oneshot::channel();

        let token = {
            let mut state = self.state.lock();
            let token = state.next_token;
            state.next_token += 1;

            if state.closed {
                // Dropping the sender abandons the wait right away.
                drop(tx);
            } else if let Some(previous) = state
                .waiters
                .insert(event.clone(), PendingWait { token, tx })
            {
                debug!(event = %event, superseded = previous.token, token, "Pending wait superseded");
            }
            token
        };

        trace!(event = %event, token, "Wait registered");

        let guard = WaitGuard {
            registry: self.clone(),
            event,
            token,
        };

        async move {
            match timeout_at(deadline, rx).await {
                Ok(Ok(data)) => Ok(data),
                Ok(Err(_)) => {
                    // Abandoned: superseded or registry closed.
                    sleep_until(deadline).await;
                    Err(guard.timeout_error(timeout))
                }
                Err(_) => Err(guard.timeout_error(timeout)),
            }
        }
    }

    /// Returns `true` if someone is waiting for `event`.
    #[must_use]
    pub fn is_waiting(&self, event: &str) -> bool {
        self.state.lock().waiters.contains_key(event)
    }

    /// Returns the number of pending waits.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Removes the entry for `event` if it still belongs to `token`.
    fn release(&self, event: &str, token: u64) {
        let mut state = self.state.lock();
        if state.waiters.get(event).is_some_and(|w| w.token == token) {
            state.waiters.remove(event);
            trace!(event = %event, token, "Wait released");
        }
    }
}

// ============================================================================
// EventRegistry - Inbound
// ============================================================================

impl EventRegistry {
    /// Handles one inbound text frame.
    ///
    /// Returns `true` if the frame resolved a waiter. Malformed frames and
    /// frames nobody waits for return `false`.
    pub fn on_message(&self, raw: &str) -> bool {
        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, len = raw.len(), "Dropping malformed frame");
                return false;
            }
        };

        self.dispatch(envelope)
    }

    /// Resolves the waiter for an already-decoded envelope.
    pub fn dispatch(&self, envelope: Envelope) -> bool {
        let waiter = self.state.lock().waiters.remove(&envelope.event);

        match waiter {
            Some(waiter) => {
                trace!(event = %envelope.event, token = waiter.token, "Wait resolved");
                // Receiver may already be gone if the caller dropped the future.
                waiter.tx.send(envelope.data).is_ok()
            }
            None => {
                debug!(event = %envelope.event, "No waiter, frame dropped");
                false
            }
        }
    }
}

// ============================================================================
// EventRegistry - Connection Ownership
// ============================================================================

impl EventRegistry {
    /// Installs a new connection, shutting down the one it replaces.
    ///
    /// Pending waits are left alone. Ids follow accept order, so a connection
    /// whose id is lower than the current one is refused: a slow handshake
    /// never displaces a panel that connected after it. After
    /// [`close`](Self::close) every new connection is refused.
    pub(crate) fn attach(&self, connection: Connection) {
        let (previous, rejected) = {
            let mut state = self.state.lock();
            let stale = state
                .connection
                .as_ref()
                .is_some_and(|current| current.id() > connection.id());

            if state.closed || stale {
                (None, Some(connection))
            } else {
                (state.connection.replace(connection), None)
            }
        };

        if let Some(previous) = previous {
            debug!(connection = previous.id(), "Replacing previous connection");
            previous.shutdown();
        }

        if let Some(rejected) = rejected {
            debug!(connection = rejected.id(), "Connection refused");
            rejected.shutdown();
        }
    }

    /// Clears the connection if it is still the one identified by `id`.
    pub(crate) fn detach(&self, id: u64) {
        let mut state = self.state.lock();
        if state.connection.as_ref().is_some_and(|c| c.id() == id) {
            state.connection = None;
            debug!(connection = id, "Connection detached");
        }
    }

    /// Shuts down the connection and discards all pending waits.
    ///
    /// Discarded waits are not resolved; their callers time out normally.
    pub fn close(&self) {
        let (connection, discarded) = {
            let mut state = self.state.lock();
            state.closed = true;
            let discarded = state.waiters.len();
            state.waiters.clear();
            (state.connection.take(), discarded)
        };

        if let Some(connection) = connection {
            connection.shutdown();
        }

        debug!(discarded, "Registry closed");
    }
}

// ============================================================================
// Deadlines
// ============================================================================

/// Stand-in for "never" when a timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Returns `now + timeout`, saturating at [`FAR_FUTURE`].
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

// ============================================================================
// WaitGuard
// ============================================================================

/// Releases a wait's registry entry when its future finishes or is dropped.
struct WaitGuard {
    registry: EventRegistry,
    event: String,
    token: u64,
}

impl WaitGuard {
    fn timeout_error(&self, timeout: Duration) -> Error {
        debug!(event = %self.event, token = self.token, "Wait timed out");
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        Error::timeout(self.event.clone(), timeout_ms)
    }
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.registry.release(&self.event, self.token);
    }
}

// ============================================================================
// Tests
// ============================================================================
