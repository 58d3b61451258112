//! Error types for the feedback bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use feedback_copilot::{Result, Error};
//!
//! async fn example(bridge: &BridgeServer) -> Result<()> {
//!     match bridge.wait_for_event("user_speech", Duration::from_secs(30)).await {
//!         Ok(transcript) => println!("{transcript}"),
//!         Err(e) if e.is_timeout() => println!("nobody answered"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Startup | [`Error::BindExhausted`], [`Error::Config`] |
//! | Lifecycle | [`Error::InvalidState`], [`Error::NoActiveSession`] |
//! | Correlation | [`Error::Timeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Malformed inbound frames and sends without a live connection are not
//! represented here: the transport absorbs them and only logs.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// Every port in the retry window was already in use.
    ///
    /// Returned by [`BridgeServer::start`](crate::transport::BridgeServer::start).
    #[error(
        "No available port after {attempts} attempts (tried {start_port}-{end_port}). \
         Free port {start_port} or configure a different base port."
    )]
    BindExhausted {
        /// First port tried.
        start_port: u16,
        /// Last port tried.
        end_port: u16,
        /// Number of bind attempts made.
        attempts: u16,
    },

    /// Configuration error.
    ///
    /// Returned when bridge or session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation not allowed in the bridge's current state.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the state violation.
        message: String,
    },

    /// A review operation was called with no session running.
    #[error("No active session. Call start_session first.")]
    NoActiveSession,

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// No matching event arrived before the deadline.
    #[error("Timeout waiting for event: {event} ({timeout_ms}ms)")]
    Timeout {
        /// Event name that was awaited.
        event: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a bind exhausted error for the inclusive port range tried.
    #[inline]
    pub fn bind_exhausted(start_port: u16, end_port: u16) -> Self {
        Self::BindExhausted {
            start_port,
            end_port,
            attempts: end_port.saturating_sub(start_port).saturating_add(1),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(event: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            event: event.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this error can only come out of bridge startup.
    #[inline]
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::BindExhausted { .. } | Self::Config { .. } | Self::Io(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed if the caller prompts again.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
