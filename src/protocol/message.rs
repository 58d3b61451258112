//! Typed outbound messages and inbound event names.
//!
//! Outbound messages serialize to the same `{event, data}` shape as
//! [`Envelope`], so they can be written straight to the socket.
//!
//! # Outbound Messages
//!
//! | Event | Payload |
//! |-------|---------|
//! | `init` | `{ appUrl, pages }` |
//! | `speak` | `{ message }` |
//! | `listen_start` | `{}` |
//! | `log_update` | `{ log: [FeedbackItem] }` |
//! | `state_update` | free-form object |
//! | `session_end` | `{ summary }` |
//! | `request_drawing` | `{ message }` |
//! | `hide_overlay` / `show_overlay` | `{}` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::{Value, to_string, to_value};

use crate::error::Result;
use crate::session::{FeedbackItem, ReviewPage, ReviewSummary};

use super::Envelope;

// ============================================================================
// ServerMessage
// ============================================================================

/// A message sent from the bridge to the remote client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session bootstrap.
    Init {
        /// URL of the application under review.
        #[serde(rename = "appUrl", skip_serializing_if = "Option::is_none")]
        app_url: Option<String>,
        /// Pages scheduled for review.
        pages: Vec<ReviewPage>,
    },

    /// Speak a message aloud.
    Speak {
        /// Text to synthesize.
        message: String,
    },

    /// Start speech recognition.
    ListenStart {},

    /// Full feedback log after an append.
    LogUpdate {
        /// Every logged item in id order.
        log: Vec<FeedbackItem>,
    },

    /// Free-form panel state patch.
    StateUpdate(Value),

    /// Session is over.
    SessionEnd {
        /// Final log summary.
        summary: ReviewSummary,
    },

    /// Ask the user to draw on the page.
    RequestDrawing {
        /// Prompt shown above the canvas.
        message: String,
    },

    /// Hide the floating panel.
    HideOverlay {},

    /// Show the floating panel.
    ShowOverlay {},
}

impl ServerMessage {
    /// Returns the wire event name.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Speak { .. } => "speak",
            Self::ListenStart {} => "listen_start",
            Self::LogUpdate { .. } => "log_update",
            Self::StateUpdate(_) => "state_update",
            Self::SessionEnd { .. } => "session_end",
            Self::RequestDrawing { .. } => "request_drawing",
            Self::HideOverlay {} => "hide_overlay",
            Self::ShowOverlay {} => "show_overlay",
        }
    }

    /// Encodes the message as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Converts the message into a generic envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_envelope(&self) -> Result<Envelope> {
        let data = match to_value(self)? {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Ok(Envelope::new(self.event_name(), data))
    }
}

// ============================================================================
// ClientEvent
// ============================================================================

/// Event names the remote client emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    /// Final speech recognition transcript.
    UserSpeech,
    /// Speech synthesis finished.
    SpeechComplete,
    /// Drawing canvas submitted.
    DrawingComplete,
}

impl ClientEvent {
    /// Returns the wire event name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserSpeech => "user_speech",
            Self::SpeechComplete => "speech_complete",
            Self::DrawingComplete => "drawing_complete",
        }
    }

    /// Looks up a client event by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "user_speech" => Some(Self::UserSpeech),
            "speech_complete" => Some(Self::SpeechComplete),
            "drawing_complete" => Some(Self::DrawingComplete),
            _ => None,
        }
    }
}

impl AsRef<str> for ClientEvent {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<ClientEvent> for String {
    #[inline]
    fn from(event: ClientEvent) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Utterance
// ============================================================================

/// Transcript sent by the panel for a shortcut button.
const NEXT_PAGE_MARKER: &str = "[[NEXT PAGE]]";

/// Transcript sent by the panel for the wrap-up button.
const WRAP_UP_MARKER: &str = "[[WRAP UP]]";

/// A `user_speech` payload, interpreted.
///
/// The panel reuses `user_speech` for its footer buttons, sending a marker
/// transcript instead of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// Recognized speech.
    Said(String),
    /// "Next page" button.
    NextPage,
    /// "Wrap up" button.
    WrapUp,
    /// Payload that is not a string.
    Other(Value),
}

impl Utterance {
    /// Interprets a `user_speech` payload.
    #[must_use]
    pub fn from_value(data: Value) -> Self {
        match data {
            Value::String(text) => match text.trim() {
                NEXT_PAGE_MARKER => Self::NextPage,
                WRAP_UP_MARKER => Self::WrapUp,
                _ => Self::Said(text),
            },
            other => Self::Other(other),
        }
    }

    /// Returns the transcript for recognized speech.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Said(text) => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn encoded(message: &ServerMessage) -> Value {
        serde_json::from_str(&message.encode().expect("encode")).expect("json")
    }

    #[test]
    fn test_init_serialization() {
        let msg = ServerMessage::Init {
            app_url: Some("http://localhost:3000".into()),
            pages: vec![ReviewPage::new("Home", "/"), ReviewPage::from("/pricing")],
        };
        assert_eq!(
            encoded(&msg),
            json!({
                "event": "init",
                "data": {
                    "appUrl": "http://localhost:3000",
                    "pages": [
                        { "name": "Home", "path": "/" },
                        { "name": "/pricing", "path": "/pricing" }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_init_without_app_url() {
        let msg = ServerMessage::Init {
            app_url: None,
            pages: Vec::new(),
        };
        assert_eq!(encoded(&msg), json!({ "event": "init", "data": { "pages": [] } }));
    }

    #[test]
    fn test_empty_payloads_are_objects() {
        assert_eq!(
            encoded(&ServerMessage::ListenStart {}),
            json!({ "event": "listen_start", "data": {} })
        );
        assert_eq!(
            encoded(&ServerMessage::HideOverlay {}),
            json!({ "event": "hide_overlay", "data": {} })
        );
        assert_eq!(
            encoded(&ServerMessage::ShowOverlay {}),
            json!({ "event": "show_overlay", "data": {} })
        );
    }

    #[test]
    fn test_state_update_passes_value_through() {
        let msg = ServerMessage::StateUpdate(json!({ "status": "thinking" }));
        assert_eq!(
            encoded(&msg),
            json!({ "event": "state_update", "data": { "status": "thinking" } })
        );
    }

    #[test]
    fn test_event_name_matches_tag() {
        let messages = [
            ServerMessage::Speak { message: "hi".into() },
            ServerMessage::ListenStart {},
            ServerMessage::LogUpdate { log: Vec::new() },
            ServerMessage::StateUpdate(json!({})),
            ServerMessage::SessionEnd {
                summary: ReviewSummary::default(),
            },
            ServerMessage::RequestDrawing { message: "x".into() },
            ServerMessage::HideOverlay {},
            ServerMessage::ShowOverlay {},
        ];

        for msg in &messages {
            assert_eq!(encoded(msg)["event"], msg.event_name());
        }
    }

    #[test]
    fn test_to_envelope() {
        let env = ServerMessage::Speak { message: "hello".into() }
            .to_envelope()
            .expect("envelope");
        assert_eq!(env.event, "speak");
        assert_eq!(env.get_string("message"), "hello");
    }

    #[test]
    fn test_client_event_names() {
        for event in [
            ClientEvent::UserSpeech,
            ClientEvent::SpeechComplete,
            ClientEvent::DrawingComplete,
        ] {
            assert_eq!(ClientEvent::from_name(event.as_str()), Some(event));
            assert_eq!(event.to_string(), event.as_str());
        }
        assert_eq!(ClientEvent::from_name("speak"), None);
    }

    #[test]
    fn test_utterance_markers() {
        assert_eq!(Utterance::from_value(json!("[[NEXT PAGE]]")), Utterance::NextPage);
        assert_eq!(Utterance::from_value(json!("[[WRAP UP]]")), Utterance::WrapUp);

        let said = Utterance::from_value(json!("the logo is blurry"));
        assert_eq!(said.text(), Some("the logo is blurry"));

        let other = Utterance::from_value(json!({ "text": "x" }));
        assert_eq!(other, Utterance::Other(json!({ "text": "x" })));
        assert_eq!(other.text(), None);
    }
}
