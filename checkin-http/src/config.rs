//! Retry policy with sensible defaults.
//!
//! [`RetryPolicy`] controls how many attempts a single logical call gets,
//! how long to back off between them, and the per-request timeout. The
//! defaults are tuned for a rate-limited remote service.

use crate::error::TransportError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest single wait or timeout, in seconds. Larger values are capped.
pub const MAX_WAIT_SECS: f64 = 86_400.0;

/// Retry behaviour for one logical HTTP call.
///
/// The wait before attempt `n` (zero-based, `n >= 1`) is
/// `backoff_base_secs ^ n + uniform(jitter_secs.0, jitter_secs.1)` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Base of the exponential backoff, in seconds.
    pub backoff_base_secs: f64,
    /// Random jitter range `(min, max)` in seconds added to every backoff.
    pub jitter_secs: (f64, f64),
    /// Per-request timeout in seconds (fractions allowed).
    pub timeout_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 2.0,
            jitter_secs: (0.5, 1.5),
            timeout_secs: 25.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never sleeps between attempts. Used by tests and
    /// by callers that pace requests themselves.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base_secs: 0.0,
            jitter_secs: (0.0, 0.0),
            ..Self::default()
        }
    }

    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        capped_secs(self.timeout_secs)
    }

    /// Calculate the wait before the zero-based `attempt`.
    ///
    /// The first attempt never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let backoff = if self.backoff_base_secs > 0.0 {
            self.backoff_base_secs.powi(exponent)
        } else {
            0.0
        };
        let (lo, hi) = self.jitter_secs;
        let jitter = if hi > lo {
            rand::thread_rng().gen_range(lo..=hi)
        } else {
            lo
        };
        capped_secs(backoff + jitter)
    }

    /// Validates this policy.
    ///
    /// Checks:
    /// - `max_attempts` must be greater than 0
    /// - `timeout_secs` must be greater than 0
    /// - `backoff_base_secs` must not be negative
    /// - `jitter_secs.0` must be <= `jitter_secs.1` and not negative
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.max_attempts == 0 {
            return Err(TransportError::Config(
                "max_attempts must be greater than 0".into(),
            ));
        }
        if !(self.timeout_secs > 0.0 && self.timeout_secs.is_finite()) {
            return Err(TransportError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.backoff_base_secs < 0.0 {
            return Err(TransportError::Config(
                "backoff_base_secs must not be negative".into(),
            ));
        }
        if self.jitter_secs.0 < 0.0 || self.jitter_secs.0 > self.jitter_secs.1 {
            return Err(TransportError::Config(
                "jitter_secs min must be >= 0 and <= max".into(),
            ));
        }
        Ok(())
    }
}

/// Seconds to a [`Duration`], capped at [`MAX_WAIT_SECS`]. NaN and
/// non-positive values are zero; infinity is the cap.
pub fn capped_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(secs.min(MAX_WAIT_SECS))
    }
}
