//! Builder for review sessions.
//!
//! # Example
//!
//! ```no_run
//! use feedback_copilot::review::ReviewSession;
//! use feedback_copilot::session::ReviewPage;
//!
//! # async fn example() -> feedback_copilot::Result<()> {
//! let session = ReviewSession::builder()
//!     .app_url("http://localhost:3000")
//!     .page(ReviewPage::new("Home", "/").with_description("hero and nav"))
//!     .page("/pricing")
//!     .base_port(4100)
//!     .start()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::session::ReviewPage;
use crate::transport::{BridgeOptions, BridgeServer};

use super::core::ReviewSession;

// ============================================================================
// ReviewSessionBuilder
// ============================================================================

/// Builder for a [`ReviewSession`].
///
/// Use [`ReviewSession::builder()`] to create one.
#[derive(Debug, Default, Clone)]
pub struct ReviewSessionBuilder {
    /// Application under review.
    app_url: Option<String>,
    /// Pages in review order.
    pages: Vec<ReviewPage>,
    /// Bridge settings.
    options: BridgeOptions,
}

// ============================================================================
// ReviewSessionBuilder Implementation
// ============================================================================

impl ReviewSessionBuilder {
    /// Creates a builder with default bridge options and no pages.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL of the application under review.
    #[inline]
    #[must_use]
    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    /// Appends a page to review.
    #[inline]
    #[must_use]
    pub fn page(mut self, page: impl Into<ReviewPage>) -> Self {
        self.pages.push(page.into());
        self
    }

    /// Appends several pages to review.
    #[must_use]
    pub fn pages<I, P>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ReviewPage>,
    {
        self.pages.extend(pages.into_iter().map(Into::into));
        self
    }

    /// Replaces the bridge options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: BridgeOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the first port the bridge tries.
    #[inline]
    #[must_use]
    pub fn base_port(mut self, port: u16) -> Self {
        self.options = self.options.with_base_port(port);
        self
    }

    /// Sets the deadline for speech waits.
    #[inline]
    #[must_use]
    pub fn event_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_event_timeout(timeout);
        self
    }

    /// Validates the configuration, binds the bridge and starts the session.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the app URL does not parse
    /// - [`Error::BindExhausted`] if no port in the window is free
    /// - [`Error::Io`] for any other bind error
    pub async fn start(self) -> Result<ReviewSession> {
        let app_url = self.validate_app_url()?;
        ReviewSession::start(BridgeServer::new(self.options), app_url, self.pages).await
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ReviewSessionBuilder {
    /// Checks the app URL is an absolute http(s) URL.
    fn validate_app_url(&self) -> Result<Option<String>> {
        let Some(raw) = self.app_url.as_deref() else {
            return Ok(None);
        };

        let url = Url::parse(raw)
            .map_err(|e| Error::config(format!("Invalid app URL '{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "App URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(Some(raw.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
