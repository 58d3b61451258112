//! Review session façade.
//!
//! The operations an agent's tool handlers call: start a session, talk to the
//! user through the panel, log feedback, move between pages and end with a
//! summary.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReviewSession`] | One running review (bridge + ledger + log) |
//! | [`ReviewSessionBuilder`] | Validated session configuration |
//! | [`ReviewHost`] | Holds at most one session |
//! | [`DrawingCapture`] | Decoded drawing payload |

// ============================================================================
// Submodules
// ============================================================================

/// Session configuration builder.
pub mod builder;

/// Core session implementation.
pub mod core;

/// Drawing payload decoding.
pub mod drawing;

/// Single-session host.
pub mod host;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ReviewSessionBuilder;
pub use core::{
    DEFAULT_DRAWING_TIMEOUT, LoggedFeedback, ReviewReport, ReviewSession, SessionStarted,
    SpeakOutcome,
};
pub use drawing::{Drawing, DrawingCapture};
pub use host::ReviewHost;
