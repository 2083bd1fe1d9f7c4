//! Backoff policy for endpoint retries
//!
//! Retries wait `base_delay * 2^attempt` between attempts, where `attempt`
//! is the zero-based index of the attempt that just failed.

use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts per endpoint
    pub max_retries: u32,

    /// Base delay for exponential backoff
    pub base_delay: Duration,

    /// Maximum delay (caps exponential growth)
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom max retries
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a retry configuration with a custom base delay
    pub fn with_base_delay(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Default::default()
        }
    }

    /// Delay to wait after the failed attempt with the given zero-based index
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether `attempt` is the last one allowed
    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_retries
    }
}
