//! Feedback Copilot - Voice-driven UI review bridge.
//!
//! This library connects an agent's tool calls to a review panel injected
//! into the web page being reviewed, over a local WebSocket.
//!
//! # Architecture
//!
//! The bridge follows a client-server model:
//!
//! - **Local End (Rust)**: Binds a port, pushes events, awaits replies by name
//! - **Remote End (Panel)**: Speaks, listens, draws, emits events back
//!
//! Key design principles:
//!
//! - One [`ReviewSession`] owns: bridge + page ledger + feedback log
//! - Every frame is `{event, data}`; replies are correlated by event name
//! - At most one panel connection; a newer one replaces the older
//! - Sends without a panel are silent no-ops
//!
//! # Quick Start
//!
//! ```no_run
//! use feedback_copilot::{FeedbackInput, Result, ReviewSession, SpeakOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = ReviewSession::builder()
//!         .app_url("http://localhost:3000")
//!         .pages(["/", "/pricing"])
//!         .start()
//!         .await?;
//!
//!     println!("Open {}", session.started().bookmarklet_url);
//!
//!     if let SpeakOutcome::UserSaid(said) = session.speak("How does this look?", true).await? {
//!         if let Some(text) = said.text() {
//!             session.log_feedback(FeedbackInput::new(text).page("/"));
//!         }
//!     }
//!
//!     let total = session.end().await;
//!     println!("Collected {total} items");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | WebSocket message types |
//! | [`review`] | Session façade: [`ReviewSession`], [`ReviewHost`] |
//! | [`session`] | Page ledger and feedback log |
//! | [`transport`] | WebSocket bridge and event correlation |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// WebSocket protocol message types.
///
/// The `{event, data}` envelope and typed outbound messages.
pub mod protocol;

/// Review session façade.
///
/// Use [`ReviewSession::builder()`] to start a session.
pub mod review;

/// Page ledger and feedback log.
pub mod session;

/// WebSocket transport layer.
///
/// Bridge server, connection handling and event correlation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{ClientEvent, Envelope, ServerMessage, Utterance};

// Review types
pub use review::{
    Drawing, DrawingCapture, LoggedFeedback, ReviewHost, ReviewReport, ReviewSession,
    ReviewSessionBuilder, SessionStarted, SpeakOutcome,
};

// Session types
pub use session::{
    Category, FeedbackInput, FeedbackItem, Progress, ReviewPage, ReviewSummary, SessionStatus,
    Severity,
};

// Transport types
pub use transport::{BridgeInfo, BridgeOptions, BridgeServer, BridgeState, EventRegistry};
