//! Review session ledger.
//!
//! Pure in-memory bookkeeping for one review: which page is being looked at
//! and what feedback has been collected so far. Nothing here does I/O or
//! locking; the owning [`ReviewSession`](crate::review::ReviewSession)
//! serializes access.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReviewPage`] | One route of the app under review |
//! | [`SessionState`] | Ordered page list, cursor and advisory status |
//! | [`ReviewLog`] | Append-only feedback log with summaries |

// ============================================================================
// Submodules
// ============================================================================

/// Pages scheduled for review.
pub mod page;

/// Append-only feedback log.
pub mod review_log;

/// Page cursor and advisory status.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use page::ReviewPage;
pub use review_log::{
    Category, FeedbackInput, FeedbackItem, ReviewLog, ReviewSummary, Severity, SeverityCounts,
};
pub use state::{Progress, SessionState, SessionStatus};
