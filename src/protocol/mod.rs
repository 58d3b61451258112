//! WebSocket protocol message types.
//!
//! This module defines the message format exchanged between the local
//! bridge (Rust) and the remote client (panel embedded in the reviewed page).
//!
//! # Protocol Overview
//!
//! Every frame is one JSON text message with the same shape in both
//! directions:
//!
//! ```json
//! { "event": "speak", "data": { "message": "Let's start with the home page" } }
//! ```
//!
//! | Direction | Events |
//! |-----------|--------|
//! | Bridge → Client | `init`, `speak`, `listen_start`, `log_update`, `state_update`, `session_end`, `request_drawing`, `hide_overlay`, `show_overlay` |
//! | Client → Bridge | `user_speech`, `speech_complete`, `drawing_complete` |
//!
//! The event name is a convention between both ends, not a request ID.
//! Unknown names are legal and pass through untouched.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | The `{event, data}` wire unit |
//! | `message` | Typed outbound messages and inbound event names |

// ============================================================================
// Submodules
// ============================================================================

/// The `{event, data}` wire unit.
pub mod envelope;

/// Typed outbound messages and inbound event names.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::Envelope;
pub use message::{ClientEvent, ServerMessage, Utterance};
