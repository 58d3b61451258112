//! Page cursor and advisory status.
//!
//! # Example
//!
//! ```
//! use feedback_copilot::session::SessionState;
//!
//! let mut state = SessionState::new(["/", "/pricing", "/signup"]);
//! assert_eq!(state.next_page(), Some("/pricing"));
//! assert_eq!(state.progress().current, 2);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

// ============================================================================
// SessionStatus
// ============================================================================

/// What the agent is doing right now.
///
/// Purely advisory: shown in the remote panel, never drives control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Looking at the current page.
    Reviewing,
    /// Waiting for the user to speak.
    Listening,
    /// Processing what the user said.
    Thinking,
    /// Applying a fix.
    Fixing,
}

impl SessionStatus {
    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reviewing => "reviewing",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Fixing => "fixing",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "reviewing" => Ok(Self::Reviewing),
            "listening" => Ok(Self::Listening),
            "thinking" => Ok(Self::Thinking),
            "fixing" => Ok(Self::Fixing),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Snapshot of how far through the page list the review is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// 1-based position of the current page.
    pub current: usize,
    /// Number of pages.
    pub total: usize,
    /// `current / total` as a whole percentage, 0 for an empty list.
    pub percent: u8,
    /// Current page, if any.
    pub current_page: Option<String>,
    /// Advisory status.
    pub status: SessionStatus,
}

// ============================================================================
// SessionState
// ============================================================================

/// Ordered, fixed page list with a clamped cursor.
///
/// The cursor always satisfies `0 <= index < pages.len()` unless the list is
/// empty, in which case there is no current page.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Pages in review order.
    pages: Vec<String>,
    /// Zero-based cursor.
    index: usize,
    /// Advisory status.
    status: SessionStatus,
    /// When the session began.
    started_at: Instant,
}

impl SessionState {
    /// Creates a new state positioned at the first page.
    #[must_use]
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            index: 0,
            status: SessionStatus::Idle,
            started_at: Instant::now(),
        }
    }

    /// Returns all pages in review order.
    #[inline]
    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Returns the current page, or `None` for an empty list.
    #[inline]
    #[must_use]
    pub fn current_page(&self) -> Option<&str> {
        self.pages.get(self.index).map(String::as_str)
    }

    /// Returns the zero-based cursor.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Advances one page.
    ///
    /// Returns the new current page, or `None` if already on the last page.
    pub fn next_page(&mut self) -> Option<&str> {
        if self.index + 1 < self.pages.len() {
            self.index += 1;
            self.current_page()
        } else {
            None
        }
    }

    /// Steps back one page.
    ///
    /// Returns the new current page, or `None` if already on the first page.
    pub fn previous_page(&mut self) -> Option<&str> {
        if self.index > 0 && !self.pages.is_empty() {
            self.index -= 1;
            self.current_page()
        } else {
            None
        }
    }

    /// Returns the advisory status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Sets the advisory status.
    #[inline]
    pub fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    /// Returns time since the session started.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns a progress snapshot.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let total = self.pages.len();
        let current = self.index + 1;
        let percent = if total == 0 {
            0
        } else {
            (current.min(total) * 100 / total) as u8
        };

        Progress {
            current,
            total,
            percent,
            current_page: self.current_page().map(str::to_string),
            status: self.status,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_next_page_clamps_at_end() {
        let mut state = SessionState::new(["a", "b", "c"]);
        assert_eq!(state.next_page(), Some("b"));
        assert_eq!(state.next_page(), Some("c"));
        assert_eq!(state.next_page(), None);
        assert_eq!(state.current_page(), Some("c"));
    }

    #[test]
    fn test_progress_after_two_steps() {
        let mut state = SessionState::new(["a", "b", "c"]);
        state.next_page();
        state.next_page();

        let progress = state.progress();
        assert_eq!(progress.current, 3);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.current_page.as_deref(), Some("c"));
    }

    #[test]
    fn test_previous_page_clamps_at_start() {
        let mut state = SessionState::new(["a", "b"]);
        assert_eq!(state.previous_page(), None);
        state.next_page();
        assert_eq!(state.previous_page(), Some("a"));
        assert_eq!(state.previous_page(), None);
    }

    #[test]
    fn test_empty_pages() {
        let mut state = SessionState::new(Vec::<String>::new());
        assert_eq!(state.current_page(), None);
        assert_eq!(state.next_page(), None);
        assert_eq!(state.previous_page(), None);

        let progress = state.progress();
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.current_page, None);
    }

    #[test]
    fn test_status_defaults_to_idle() {
        let mut state = SessionState::new(["a"]);
        assert_eq!(state.status(), SessionStatus::Idle);
        state.set_status(SessionStatus::Listening);
        assert_eq!(state.progress().status, SessionStatus::Listening);
    }

    #[test]
    fn test_status_round_trips_names() {
        for status in [
            SessionStatus::Idle,
            SessionStatus::Reviewing,
            SessionStatus::Listening,
            SessionStatus::Thinking,
            SessionStatus::Fixing,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).expect("json"),
                serde_json::json!(status.as_str())
            );
        }
        assert!("sleeping".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_progress_serializes_camel_case() {
        let state = SessionState::new(["home"]);
        let value = serde_json::to_value(state.progress()).expect("json");
        assert_eq!(value["currentPage"], "home");
        assert_eq!(value["status"], "idle");
    }

    proptest! {
        #[test]
        fn prop_cursor_stays_in_bounds(
            len in 0usize..8,
            moves in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let pages: Vec<String> = (0..len).map(|i| format!("/p{i}")).collect();
            let mut state = SessionState::new(pages.clone());

            for forward in moves {
                let before = state.index();
                let moved = if forward {
                    state.next_page().map(str::to_string)
                } else {
                    state.previous_page().map(str::to_string)
                };

                match moved {
                    Some(page) => {
                        prop_assert_eq!(before.abs_diff(state.index()), 1);
                        prop_assert_eq!(Some(page), pages.get(state.index()).cloned());
                    }
                    None => prop_assert_eq!(before, state.index()),
                }

                if len == 0 {
                    prop_assert!(state.current_page().is_none());
                } else {
                    prop_assert!(state.index() < len);
                }
            }
        }
    }
}
