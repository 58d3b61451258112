//! The `{event, data}` wire unit.
//!
//! Envelopes carry an opaque event name and a schema-less JSON payload.
//! Payloads are shaped only at the call site that expects a structure.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, from_str, to_string};

use crate::error::Result;

// ============================================================================
// Envelope
// ============================================================================

/// A single protocol frame.
///
/// # Format
///
/// ```json
/// {
///   "event": "user_speech",
///   "data": "the header looks cramped"
/// }
/// ```
///
/// A frame without `data` decodes with `data = null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name agreed by both ends.
    pub event: String,

    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Creates a new envelope.
    #[inline]
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Decodes an envelope from a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the frame is not a JSON
    /// object with a string `event` field.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(from_str(text)?)
    }

    /// Encodes the envelope as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the payload cannot be
    /// serialized.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Returns `true` if the envelope carries the given event name.
    #[inline]
    #[must_use]
    pub fn is(&self, event: &str) -> bool {
        self.event == event
    }
}

// ============================================================================
// Payload Helpers
// ============================================================================

impl Envelope {
    /// Gets a string field from an object payload.
    ///
    /// Returns empty string if the field is missing or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.data
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Returns the payload as text when it is a bare string.
    ///
    /// Speech transcripts arrive this way.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.data.as_str()
    }
}

// ============================================================================
// Tests
// ============================================================================
