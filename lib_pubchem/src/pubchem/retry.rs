//! # Retry Policy
//!
//! How many times the substance lookup is attempted and how long to wait in
//! between. The wait comes from a [`DelayStrategy`] so tests can swap the
//! random jitter for a fixed delay.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Default number of attempts for the substance lookup.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default lower bound of the jittered delay, in seconds.
pub const DEFAULT_MIN_DELAY_SECS: f64 = 2.0;
/// Default upper bound of the jittered delay, in seconds.
pub const DEFAULT_MAX_DELAY_SECS: f64 = 10.0;

/// Invalid retry settings.
#[derive(Debug, Error, PartialEq)]
pub enum RetryConfigError {
    #[error("Delay bounds must be finite and non-negative (got {min}..={max})")]
    InvalidBound { min: f64, max: f64 },

    #[error("Minimum delay {min}s is greater than maximum delay {max}s")]
    InvertedRange { min: f64, max: f64 },

    #[error("At least one attempt is required")]
    ZeroAttempts,
}

/// Produces the wait before the next attempt.
pub trait DelayStrategy: Send + Sync + fmt::Debug {
    /// Delay to sleep after failed attempt number `attempt` (1-based).
    fn next_delay(&self, attempt: u32) -> Duration;
}

/// Uniformly random delay within `[min, max]`. Not exponential: every wait is
/// drawn from the same range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitteredDelay {
    min: Duration,
    max: Duration,
}

impl JitteredDelay {
    /// Builds the strategy from second bounds.
    pub fn from_secs_f64(min: f64, max: f64) -> Result<Self, RetryConfigError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(RetryConfigError::InvalidBound { min, max });
        }
        if min > max {
            return Err(RetryConfigError::InvertedRange { min, max });
        }
        Ok(Self {
            min: Duration::from_secs_f64(min),
            max: Duration::from_secs_f64(max),
        })
    }
}

impl Default for JitteredDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_secs_f64(DEFAULT_MIN_DELAY_SECS),
            max: Duration::from_secs_f64(DEFAULT_MAX_DELAY_SECS),
        }
    }
}

impl DelayStrategy for JitteredDelay {
    fn next_delay(&self, _attempt: u32) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Always the same delay. `FixedDelay(Duration::ZERO)` retries immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedDelay(pub Duration);

impl DelayStrategy for FixedDelay {
    fn next_delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// # Retry Policy
///
/// Attempt limit plus delay strategy for the substance lookup. The compound
/// lookup never retries and does not use this.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Arc<dyn DelayStrategy>,
}

impl RetryPolicy {
    /// A policy with `max_attempts` tries and the given wait between them.
    pub fn new(max_attempts: u32, delay: Arc<dyn DelayStrategy>) -> Result<Self, RetryConfigError> {
        if max_attempts == 0 {
            return Err(RetryConfigError::ZeroAttempts);
        }
        Ok(Self { max_attempts, delay })
    }

    /// Total attempts, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delay.next_delay(attempt)
    }
}

impl Default for RetryPolicy {
    /// Five attempts, 2 to 10 seconds apart.
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Arc::new(JitteredDelay::default()),
        }
    }
}
