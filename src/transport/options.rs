//! Bridge binding and timeout configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use feedback_copilot::transport::BridgeOptions;
//!
//! let options = BridgeOptions::new()
//!     .with_base_port(4000)
//!     .with_max_retries(3)
//!     .with_event_timeout(Duration::from_secs(60));
//!
//! assert_eq!(options.last_port(), 4002);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default port the bridge tries first.
pub const DEFAULT_BASE_PORT: u16 = 3847;

/// Default number of consecutive ports tried before giving up.
pub const DEFAULT_MAX_RETRIES: u16 = 10;

/// Default deadline for a single `wait_for_event` call.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// BridgeOptions
// ============================================================================

/// Bridge server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Address to bind the listener to.
    pub bind_ip: IpAddr,

    /// First port to try.
    pub base_port: u16,

    /// Number of ports tried, starting at `base_port`. Zero is treated as one.
    pub max_retries: u16,

    /// Deadline used when a wait does not specify one.
    pub event_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            base_port: DEFAULT_BASE_PORT,
            max_retries: DEFAULT_MAX_RETRIES,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeOptions {
    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the first port to try. Port 0 lets the OS pick one.
    #[inline]
    #[must_use]
    pub fn with_base_port(mut self, port: u16) -> Self {
        self.base_port = port;
        self
    }

    /// Sets how many consecutive ports are tried.
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u16) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the default event deadline.
    #[inline]
    #[must_use]
    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }
}

// ============================================================================
// Derived Values
// ============================================================================

impl BridgeOptions {
    /// Returns the number of bind attempts, at least one.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u16 {
        self.max_retries.max(1)
    }

    /// Returns the last port in the retry window, saturating at `u16::MAX`.
    #[inline]
    #[must_use]
    pub fn last_port(&self) -> u16 {
        self.base_port.saturating_add(self.attempts() - 1)
    }
}

// ============================================================================
// Tests
// ============================================================================
