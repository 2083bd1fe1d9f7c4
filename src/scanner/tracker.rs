//! Per-endpoint consecutive failure counters

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Consecutive failed attempts per endpoint
///
/// Counters live for the process lifetime only. Each endpoint's counter is
/// only touched by that endpoint's own fetch path, so the lock is held for a
/// single map operation at a time.
#[derive(Debug, Default)]
pub struct FailureTracker {
    counters: Mutex<HashMap<String, u32>>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt and return the new count
    pub fn increment(&self, endpoint: &str) -> u32 {
        let mut counters = self.counters();
        let count = counters.entry(endpoint.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Clear the counter of `endpoint`
    pub fn reset(&self, endpoint: &str) {
        self.counters().insert(endpoint.to_string(), 0);
    }

    /// Current count, zero for unknown endpoints
    pub fn get(&self, endpoint: &str) -> u32 {
        self.counters().get(endpoint).copied().unwrap_or(0)
    }

    /// Copy of every counter
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.counters().clone()
    }

    // A panic while holding the lock cannot leave a counter half-written.
    fn counters(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
