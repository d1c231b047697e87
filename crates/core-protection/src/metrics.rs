//! Per-key attempt/outcome counters
//!
//! Counters are monotonic between resets; timestamps record the most recent
//! attempt, success, and failure for diagnostics.

use std::time::Instant;

/// Snapshot of one action key's protection metrics
#[derive(Debug, Clone, Default)]
pub struct ActionMetrics {
    /// Total `check_action` calls, admitted or not
    pub total_attempts: u64,

    /// Executions recorded as successful
    pub successful_executions: u64,

    /// Attempts rejected by the rate limiter
    pub rate_limited_attempts: u64,

    /// Attempts rejected by an open circuit
    pub circuit_breaker_rejections: u64,

    /// When the key was last checked
    pub last_attempt_time: Option<Instant>,

    /// When a success was last recorded
    pub last_success_time: Option<Instant>,

    /// When a failure was last recorded
    pub last_failure_time: Option<Instant>,
}

impl ActionMetrics {
    /// Fraction of attempts that ended in a recorded success (0.0 with no attempts)
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.successful_executions as f64 / self.total_attempts as f64
        }
    }
}
