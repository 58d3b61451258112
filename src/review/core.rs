//! Review session: bridge, ledger and log owned together.
//!
//! A [`ReviewSession`] is the unit the agent's tool calls operate on. It owns
//! one [`BridgeServer`], one [`SessionState`] and one [`ReviewLog`], and
//! tears all three down in [`ReviewSession::end`].
//!
//! # Example
//!
//! ```no_run
//! use feedback_copilot::review::{ReviewSession, SpeakOutcome};
//!
//! # async fn example() -> feedback_copilot::Result<()> {
//! let session = ReviewSession::builder()
//!     .app_url("http://localhost:3000")
//!     .page("/")
//!     .page("/pricing")
//!     .start()
//!     .await?;
//!
//! if let SpeakOutcome::UserSaid(utterance) = session.speak("What do you think?", true).await? {
//!     println!("{utterance:?}");
//! }
//!
//! session.end().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::protocol::{ClientEvent, ServerMessage, Utterance};
use crate::session::{
    FeedbackInput, FeedbackItem, Progress, ReviewLog, ReviewPage, ReviewSummary, SessionState,
    SessionStatus,
};
use crate::transport::{BridgeInfo, BridgeServer, BridgeState};

use super::builder::ReviewSessionBuilder;
use super::drawing::DrawingCapture;

// ============================================================================
// Constants
// ============================================================================

/// Prompt shown when a drawing request carries no message.
const DEFAULT_DRAWING_PROMPT: &str = "Draw on the screen to highlight what you mean.";

/// Default deadline for a drawing.
pub const DEFAULT_DRAWING_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// Result Types
// ============================================================================

/// Returned when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStarted {
    /// Session identifier, for logs.
    pub session_id: Uuid,
    /// Bound port.
    pub port: u16,
    /// Bridge base URL.
    pub panel_url: String,
    /// Instructions page for injecting the panel.
    pub bookmarklet_url: String,
    /// Script to paste into the page's console to inject the panel.
    pub console_snippet: String,
    /// Number of pages scheduled.
    pub pages_to_review: usize,
}

impl SessionStarted {
    fn new(session_id: Uuid, info: &BridgeInfo, pages_to_review: usize) -> Self {
        Self {
            session_id,
            port: info.port,
            panel_url: info.base_url.clone(),
            bookmarklet_url: info.instructions_url.clone(),
            console_snippet: format!(
                "document.body.appendChild(Object.assign(document.createElement('script'),\
                 {{src:'{}/overlay.js'}}))",
                info.base_url
            ),
            pages_to_review,
        }
    }
}

/// Result of [`ReviewSession::speak`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// No panel attached; nothing was sent or awaited.
    PanelNotConnected {
        /// The message that was not delivered.
        message_queued: String,
        /// Where the user can find injection instructions.
        bookmarklet_url: String,
    },
    /// The user answered.
    UserSaid(Utterance),
    /// Speech finished, no answer requested.
    Spoken,
}

/// Result of [`ReviewSession::log_feedback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedFeedback {
    /// The stored item.
    pub item: FeedbackItem,
    /// Log size after the append.
    pub total_items: usize,
}

/// Full log contents plus summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewReport {
    /// Aggregates.
    pub summary: ReviewSummary,
    /// Every item in id order.
    pub items: Vec<FeedbackItem>,
    /// Number of items.
    pub total: usize,
}

// ============================================================================
// ReviewSession
// ============================================================================

/// One running review.
///
/// All methods take `&self`, so a feedback item can be logged while another
/// task is waiting on the user.
pub struct ReviewSession {
    /// Session identifier.
    id: Uuid,
    /// Connection to the panel.
    bridge: BridgeServer,
    /// Page cursor and status.
    state: Mutex<SessionState>,
    /// Collected feedback.
    log: Mutex<ReviewLog>,
    /// Start details.
    started: SessionStarted,
}

impl fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewSession")
            .field("id", &self.id)
            .field("bridge", &self.bridge)
            .field("items", &self.log.lock().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ReviewSession - Lifecycle
// ============================================================================

impl ReviewSession {
    /// Creates a builder for configuring a session.
    #[inline]
    #[must_use]
    pub fn builder() -> ReviewSessionBuilder {
        ReviewSessionBuilder::new()
    }

    /// Starts the bridge and announces the session to the panel.
    pub(crate) async fn start(
        bridge: BridgeServer,
        app_url: Option<String>,
        pages: Vec<ReviewPage>,
    ) -> Result<Self> {
        let id = Uuid::new_v4();
        let info = bridge.start().await?;

        let state = SessionState::new(pages.iter().map(|page| page.name.clone()));
        let started = SessionStarted::new(id, &info, pages.len());

        // Usually dropped: the panel cannot have connected yet.
        bridge.send_message(&ServerMessage::Init { app_url, pages });

        info!(session = %id, port = info.port, pages = started.pages_to_review, "Review session started");

        Ok(Self {
            id,
            bridge,
            state: Mutex::new(state),
            log: Mutex::new(ReviewLog::new()),
            started,
        })
    }

    /// Sends the final summary, then stops the bridge.
    ///
    /// Returns the number of feedback items collected.
    pub async fn end(self) -> usize {
        let summary = self.log.lock().summary();
        let total = summary.total;

        self.bridge.send_message(&ServerMessage::SessionEnd { summary });
        self.bridge.stop().await;

        info!(session = %self.id, total, "Review session ended");
        total
    }
}

// ============================================================================
// ReviewSession - Accessors
// ============================================================================

impl ReviewSession {
    /// Returns the session identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the start details.
    #[inline]
    #[must_use]
    pub fn started(&self) -> &SessionStarted {
        &self.started
    }

    /// Returns the bridge.
    #[inline]
    #[must_use]
    pub fn bridge(&self) -> &BridgeServer {
        &self.bridge
    }

    /// Returns `true` if the panel is attached.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.bridge.is_connected()
    }

    /// Returns the bridge state.
    #[inline]
    #[must_use]
    pub fn bridge_state(&self) -> BridgeState {
        self.bridge.state()
    }

    /// Returns the current page.
    #[must_use]
    pub fn current_page(&self) -> Option<String> {
        self.state.lock().current_page().map(str::to_string)
    }

    /// Returns a progress snapshot.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.state.lock().progress()
    }

    /// Returns time since the session started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed()
    }

    fn event_timeout(&self) -> Duration {
        self.bridge.options().event_timeout
    }
}

// ============================================================================
// ReviewSession - Voice
// ============================================================================

impl ReviewSession {
    /// Speaks a message through the panel.
    ///
    /// With `await_response` the panel listens after speaking and the user's
    /// answer is returned; otherwise this waits for speech to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`](crate::Error::Timeout) if the panel does not
    /// answer in time.
    pub async fn speak(
        &self,
        message: impl Into<String>,
        await_response: bool,
    ) -> Result<SpeakOutcome> {
        let message = message.into();

        if !self.bridge.is_connected() {
            debug!(session = %self.id, "Panel not connected, speech not sent");
            return Ok(SpeakOutcome::PanelNotConnected {
                message_queued: message,
                bookmarklet_url: self.started.bookmarklet_url.clone(),
            });
        }

        let reply = if await_response {
            ClientEvent::UserSpeech
        } else {
            ClientEvent::SpeechComplete
        };

        let data = self
            .bridge
            .request_message(&ServerMessage::Speak { message }, reply, self.event_timeout())
            .await?;

        Ok(if await_response {
            SpeakOutcome::UserSaid(Utterance::from_value(data))
        } else {
            SpeakOutcome::Spoken
        })
    }

    /// Starts the microphone and waits for the user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`](crate::Error::Timeout) if nothing is said in
    /// time.
    pub async fn listen(&self) -> Result<Utterance> {
        let data = self
            .bridge
            .request_message(
                &ServerMessage::ListenStart {},
                ClientEvent::UserSpeech,
                self.event_timeout(),
            )
            .await?;

        Ok(Utterance::from_value(data))
    }

    /// Asks the user to draw on the page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`](crate::Error::Timeout) if no drawing arrives
    /// within `timeout` (default 120 s).
    pub async fn request_drawing(
        &self,
        message: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<DrawingCapture> {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_DRAWING_PROMPT)
            .to_string();

        let data = self
            .bridge
            .request_message(
                &ServerMessage::RequestDrawing { message },
                ClientEvent::DrawingComplete,
                timeout.unwrap_or(DEFAULT_DRAWING_TIMEOUT),
            )
            .await?;

        Ok(DrawingCapture::from_value(data))
    }
}

// ============================================================================
// ReviewSession - Feedback
// ============================================================================

impl ReviewSession {
    /// Logs a feedback item and pushes the log to the panel.
    pub fn log_feedback(&self, input: FeedbackInput) -> LoggedFeedback {
        let (item, log, total_items) = {
            let mut review_log = self.log.lock();
            let item = review_log.add(input);
            (item, review_log.items().to_vec(), review_log.len())
        };

        debug!(session = %self.id, id = item.id, severity = %item.severity, "Feedback logged");
        self.bridge.send_message(&ServerMessage::LogUpdate { log });

        LoggedFeedback { item, total_items }
    }

    /// Returns the log with its summary.
    #[must_use]
    pub fn summary(&self) -> ReviewReport {
        let log = self.log.lock();
        ReviewReport {
            summary: log.summary(),
            items: log.items().to_vec(),
            total: log.len(),
        }
    }
}

// ============================================================================
// ReviewSession - Panel State
// ============================================================================

impl ReviewSession {
    /// Pushes a free-form state patch to the panel.
    pub fn update_panel_state(&self, state: Value) {
        self.bridge.send_message(&ServerMessage::StateUpdate(state));
    }

    /// Records the advisory status and shows it on the panel.
    pub fn set_status(&self, status: SessionStatus) {
        self.state.lock().set_status(status);
        self.update_panel_state(json!({ "status": status }));
    }

    /// Moves to the next page. `None` when already on the last page.
    pub fn next_page(&self) -> Option<String> {
        let (page, progress) = {
            let mut state = self.state.lock();
            let page = state.next_page()?.to_string();
            (page, state.progress())
        };
        Some(self.announce_page(page, progress))
    }

    /// Moves to the previous page. `None` when already on the first page.
    pub fn previous_page(&self) -> Option<String> {
        let (page, progress) = {
            let mut state = self.state.lock();
            let page = state.previous_page()?.to_string();
            (page, state.progress())
        };
        Some(self.announce_page(page, progress))
    }

    fn announce_page(&self, page: String, progress: Progress) -> String {
        self.update_panel_state(json!({ "currentPage": page, "progress": progress }));
        page
    }

    /// Hides the floating panel.
    pub fn hide_overlay(&self) {
        self.bridge.send_message(&ServerMessage::HideOverlay {});
    }

    /// Shows the floating panel.
    pub fn show_overlay(&self) {
        self.bridge.send_message(&ServerMessage::ShowOverlay {});
    }
}

// ============================================================================
// Tests
// ============================================================================
