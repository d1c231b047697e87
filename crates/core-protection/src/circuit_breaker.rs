//! Keyed circuit breaker for failure isolation
//!
//! Each action key owns an independent breaker with three states:
//! - Closed: normal operation, calls pass through
//! - Open: the action has failed repeatedly, calls fail immediately
//! - HalfOpen: cool-down elapsed, cautiously probing for recovery
//!
//! Reads are deliberately side-effecting: `can_execute` and `state` evaluate
//! the Open → HalfOpen timeout under the same lock as writes, so two racing
//! callers cannot observe an inconsistent double transition.
//!
//! # Example
//!
//! ```
//! use tether_core_protection::circuit_breaker::{BreakerConfig, CircuitBreaker, CircuitState};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let breaker = CircuitBreaker::new();
//! breaker
//!     .configure(
//!         "shutdown",
//!         BreakerConfig {
//!             failure_threshold: 2,
//!             success_threshold: 1,
//!             timeout: Duration::from_secs(120),
//!         },
//!     )
//!     .await;
//!
//! breaker.record_failure("shutdown").await;
//! breaker.record_failure("shutdown").await;
//! assert_eq!(breaker.state("shutdown").await, CircuitState::Open);
//! assert!(!breaker.can_execute("shutdown").await);
//! # });
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// State of one key's circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through normally
    Closed,
    /// Calls fail immediately until the cool-down elapses
    Open,
    /// Probing: limited calls allowed to test recovery
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Per-key breaker tuning
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures in Closed before the circuit opens
    pub failure_threshold: u32,

    /// Consecutive successes in HalfOpen before the circuit closes
    pub success_threshold: u32,

    /// Cool-down before an Open circuit transitions to HalfOpen
    pub timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Mutable record tracked per key
#[derive(Debug)]
struct CircuitRecord {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
    last_state_change: Instant,
    config: BreakerConfig,
}

impl CircuitRecord {
    fn new(config: BreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
            last_state_change: Instant::now(),
            config,
        }
    }

    /// Fold the Open → HalfOpen timeout into the record. Idempotent.
    fn advance(&mut self, key: &str, now: Instant) {
        if self.state == CircuitState::Open
            && now.saturating_duration_since(self.last_state_change) >= self.config.timeout
        {
            self.state = CircuitState::HalfOpen;
            self.success_count = 0;
            self.last_state_change = now;
            info!(key, "circuit cool-down elapsed, transitioning to half-open");
        }
    }
}

/// Internal state: lazily-populated records plus per-key configuration overrides
#[derive(Debug, Default)]
struct CircuitBreakerState {
    records: HashMap<String, CircuitRecord>,
    configs: HashMap<String, BreakerConfig>,
    default_config: BreakerConfig,
}

impl CircuitBreakerState {
    fn config_for(&self, key: &str) -> BreakerConfig {
        self.configs
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    fn record_mut(&mut self, key: &str) -> &mut CircuitRecord {
        let config = self.config_for(key);
        self.records
            .entry(key.to_string())
            .or_insert_with(|| CircuitRecord::new(config))
    }
}

/// Failure-isolation state machine across a set of action keys
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    state: Mutex<CircuitBreakerState>,
}

impl CircuitBreaker {
    /// Create a breaker where unconfigured keys use [`BreakerConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a breaker with a custom fallback config for unconfigured keys
    pub fn with_default_config(default_config: BreakerConfig) -> Self {
        Self {
            state: Mutex::new(CircuitBreakerState {
                default_config,
                ..Default::default()
            }),
        }
    }

    /// Whether the key's circuit currently admits calls
    ///
    /// Side-effecting read: evaluates the Open → HalfOpen timeout first.
    pub async fn can_execute(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        let record = state.record_mut(key);
        record.advance(key, Instant::now());
        record.state != CircuitState::Open
    }

    /// Current state of the key's circuit
    ///
    /// Side-effecting read: evaluates the Open → HalfOpen timeout first.
    pub async fn state(&self, key: &str) -> CircuitState {
        let mut state = self.state.lock().await;
        let record = state.record_mut(key);
        record.advance(key, Instant::now());
        record.state
    }

    /// Consecutive failure count for the key (diagnostic)
    pub async fn failure_count(&self, key: &str) -> u32 {
        let mut state = self.state.lock().await;
        state.record_mut(key).failure_count
    }

    /// Record a successful execution for the key
    pub async fn record_success(&self, key: &str) {
        let mut state = self.state.lock().await;
        let record = state.record_mut(key);

        match record.state {
            CircuitState::Closed => {
                record.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                record.success_count += 1;
                if record.success_count >= record.config.success_threshold {
                    record.state = CircuitState::Closed;
                    record.failure_count = 0;
                    record.success_count = 0;
                    record.last_state_change = Instant::now();
                    info!(key, "circuit recovered, closing");
                }
            }
            // No defined edge for a success while open; the gate should have
            // rejected the call before it could run.
            CircuitState::Open => {
                debug!(key, "success recorded while circuit open, ignoring");
            }
        }
    }

    /// Record a failed execution for the key
    pub async fn record_failure(&self, key: &str) {
        let mut state = self.state.lock().await;
        let record = state.record_mut(key);
        let now = Instant::now();
        record.last_failure_time = Some(now);

        match record.state {
            CircuitState::Closed => {
                record.failure_count += 1;
                if record.failure_count >= record.config.failure_threshold {
                    record.state = CircuitState::Open;
                    record.last_state_change = now;
                    warn!(
                        key,
                        failures = record.failure_count,
                        "failure threshold reached, opening circuit"
                    );
                }
            }
            CircuitState::HalfOpen => {
                record.state = CircuitState::Open;
                record.success_count = 0;
                record.last_state_change = now;
                warn!(key, "probe failed in half-open, reopening circuit");
            }
            CircuitState::Open => {
                // Already open, nothing to do
            }
        }
    }

    /// Install per-key tuning; an existing record keeps its state but adopts
    /// the new thresholds
    pub async fn configure(&self, key: &str, config: BreakerConfig) {
        let mut state = self.state.lock().await;
        state.configs.insert(key.to_string(), config.clone());
        if let Some(record) = state.records.get_mut(key) {
            record.config = config;
        }
    }

    /// Restore the key's circuit to Closed with zeroed counters
    pub async fn reset(&self, key: &str) {
        let mut state = self.state.lock().await;
        let config = state.config_for(key);
        if let Some(record) = state.records.get_mut(key) {
            *record = CircuitRecord::new(config);
        }
    }
}
