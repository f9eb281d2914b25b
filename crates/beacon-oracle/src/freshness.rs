//! Freshness policy for signed timestamps.
//!
//! A signed timestamp is accepted only inside a window around the current
//! time: no older than [`FRESHNESS_WINDOW_SECS`] and no more than
//! [`CLOCK_SKEW_SECS`] ahead. This is what stops an old signature from being
//! replayed long after it was produced.

use crate::{OracleError, Result};

/// Maximum age of an accepted timestamp in seconds (1 hour).
pub const FRESHNESS_WINDOW_SECS: u64 = 3600;

/// Maximum lead of an accepted timestamp over `now` in seconds (15 minutes).
pub const CLOCK_SKEW_SECS: u64 = 900;

/// Acceptance window for signed timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// Maximum age in seconds.
    window_secs: u64,
    /// Maximum lead in seconds.
    skew_secs: u64,
}

impl FreshnessPolicy {
    /// Create a policy with the default window and skew.
    pub fn new() -> Self {
        Self {
            window_secs: FRESHNESS_WINDOW_SECS,
            skew_secs: CLOCK_SKEW_SECS,
        }
    }

    /// Create a policy with a custom window and skew.
    pub fn with_windows(window_secs: u64, skew_secs: u64) -> Self {
        Self {
            window_secs,
            skew_secs,
        }
    }

    /// Check `timestamp` against the window at `now`.
    ///
    /// Accepts iff `timestamp + window > now` and `timestamp < now + skew`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::StaleTimestamp`] if the timestamp is too old
    /// - [`OracleError::FutureTimestamp`] if the timestamp is too far ahead
    pub fn check(&self, timestamp: u64, now: u64) -> Result<()> {
        if timestamp.saturating_add(self.window_secs) <= now {
            tracing::warn!(timestamp, now, "rejecting stale timestamp");
            return Err(OracleError::StaleTimestamp { timestamp, now });
        }
        if timestamp >= now.saturating_add(self.skew_secs) {
            tracing::warn!(timestamp, now, "rejecting future timestamp");
            return Err(OracleError::FutureTimestamp { timestamp, now });
        }
        Ok(())
    }

    /// Whether `timestamp` is acceptable at `now`.
    pub fn is_fresh(&self, timestamp: u64, now: u64) -> bool {
        self.check(timestamp, now).is_ok()
    }

    /// Return the configured window.
    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Return the configured skew allowance.
    pub fn skew_secs(&self) -> u64 {
        self.skew_secs
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new()
    }
}
