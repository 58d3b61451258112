//! WebSocket transport layer.
//!
//! This module handles communication between the local bridge (Rust) and
//! the remote client (panel injected into the reviewed page) via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                          ┌─────────────────┐
//! │  BridgeServer (Rust) │                          │  Remote client  │
//! │                      │        WebSocket         │  (page panel)   │
//! │  EventRegistry       │◄────────────────────────►│                 │
//! │  → Connection        │     localhost:PORT       │  {event, data}  │
//! │                      │                          │                 │
//! └──────────────────────┘                          └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `BridgeServer::start` - Bind `base_port`, retrying upward while in use
//! 2. The panel connects; the accept loop upgrades and installs it
//! 3. `Connection` - Frames flow; inbound frames resolve registry waits
//! 4. A newer connection replaces it, or it closes and detaches itself
//! 5. `BridgeServer::stop` - Discard waits, close, release the listener
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `options` | Bind and timeout configuration |
//! | `registry` | Event name → waiter correlation |
//! | `server` | Listener, port retry, lifecycle |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Bridge configuration.
pub mod options;

/// Event correlation registry.
pub mod registry;

/// Bridge server.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use options::BridgeOptions;
pub use registry::EventRegistry;
pub use server::{BridgeInfo, BridgeServer, BridgeState};
