//! Single-session host.
//!
//! Tool handlers look the running session up here. Starting a new session
//! ends the previous one first, so at most one bridge is ever bound.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::{Error, Result};

use super::builder::ReviewSessionBuilder;
use super::core::{ReviewSession, SessionStarted};

// ============================================================================
// ReviewHost
// ============================================================================

/// Holds at most one [`ReviewSession`].
#[derive(Debug, Default)]
pub struct ReviewHost {
    session: Option<ReviewSession>,
}

impl ReviewHost {
    /// Creates a host with no session.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// Ends any running session, then starts a new one from `builder`.
    ///
    /// # Errors
    ///
    /// Propagates the builder's startup errors. The previous session is
    /// ended either way.
    pub async fn start_session(&mut self, builder: ReviewSessionBuilder) -> Result<SessionStarted> {
        if let Some(previous) = self.session.take() {
            debug!(session = %previous.id(), "Ending previous session before restart");
            previous.end().await;
        }

        let session = builder.start().await?;
        let started = session.started().clone();
        self.session = Some(session);
        Ok(started)
    }

    /// Ends the running session. Returns the number of items collected,
    /// zero when nothing was running.
    pub async fn end_session(&mut self) -> usize {
        match self.session.take() {
            Some(session) => session.end().await,
            None => 0,
        }
    }

    /// Returns the running session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSession`] when idle.
    pub fn session(&self) -> Result<&ReviewSession> {
        self.session.as_ref().ok_or(Error::NoActiveSession)
    }

    /// Returns `true` if a session is running.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
