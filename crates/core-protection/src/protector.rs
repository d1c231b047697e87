//! Resource protector: the admission coordinator
//!
//! Composes the keyed circuit breaker and rate limiter behind a fixed gate
//! order — global kill switch, then circuit, then token bucket — so a
//! known-bad circuit is rejected before a token is consumed. Owns the
//! per-key metrics and the global enable flag.
//!
//! # Example
//!
//! ```
//! use tether_core_protection::ResourceProtector;
//!
//! # tokio_test::block_on(async {
//! let protector = ResourceProtector::new();
//!
//! protector.check_action("lock_screen").await.unwrap();
//! protector.record_success("lock_screen").await;
//!
//! let metrics = protector.metrics("lock_screen").await;
//! assert_eq!(metrics.total_attempts, 1);
//! assert_eq!(metrics.successful_executions, 1);
//! # });
//! ```

use crate::circuit_breaker::{BreakerConfig, CircuitBreaker, CircuitState};
use crate::error::{ProtectedCallError, ProtectionError};
use crate::metrics::ActionMetrics;
use crate::rate_limiter::{BucketConfig, RateLimiter};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug)]
struct ProtectorState {
    enabled: bool,
    metrics: HashMap<String, ActionMetrics>,
}

/// Coordinator gating named actions through enable check → circuit → bucket
#[derive(Debug)]
pub struct ResourceProtector {
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    state: Mutex<ProtectorState>,
}

impl Default for ResourceProtector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProtector {
    /// Create an enabled protector with default per-key tuning
    pub fn new() -> Self {
        Self {
            limiter: RateLimiter::new(),
            breaker: CircuitBreaker::new(),
            state: Mutex::new(ProtectorState {
                enabled: true,
                metrics: HashMap::new(),
            }),
        }
    }

    /// Ask whether the named action may run right now
    ///
    /// Increments `total_attempts` and stamps `last_attempt_time` on every
    /// call, admitted or not.
    pub async fn check_action(&self, key: &str) -> Result<(), ProtectionError> {
        let enabled = {
            let mut state = self.state.lock().await;
            let metrics = state.metrics.entry(key.to_string()).or_default();
            metrics.total_attempts += 1;
            metrics.last_attempt_time = Some(Instant::now());
            state.enabled
        };

        if !enabled {
            debug!(key, "check rejected: protection disabled");
            return Err(ProtectionError::ProtectionDisabled);
        }

        // Circuit first: fail fast on a known-bad action before spending a token
        let circuit = self.breaker.state(key).await;
        if circuit == CircuitState::Open {
            let mut state = self.state.lock().await;
            if let Some(metrics) = state.metrics.get_mut(key) {
                metrics.circuit_breaker_rejections += 1;
            }
            debug!(key, "check rejected: circuit open");
            return Err(ProtectionError::CircuitOpen {
                key: key.to_string(),
                state: circuit,
            });
        }

        if !self.limiter.allow_action(key).await {
            let retry_after = self.limiter.retry_hint(key).await;
            let mut state = self.state.lock().await;
            if let Some(metrics) = state.metrics.get_mut(key) {
                metrics.rate_limited_attempts += 1;
            }
            debug!(key, "check rejected: rate limited");
            return Err(ProtectionError::RateLimited {
                key: key.to_string(),
                retry_after,
            });
        }

        Ok(())
    }

    /// Record a successful execution: closes in on the breaker, bumps metrics
    pub async fn record_success(&self, key: &str) {
        self.breaker.record_success(key).await;

        let mut state = self.state.lock().await;
        let metrics = state.metrics.entry(key.to_string()).or_default();
        metrics.successful_executions += 1;
        metrics.last_success_time = Some(Instant::now());
    }

    /// Record a failed execution: feeds the breaker, stamps the failure time
    pub async fn record_failure(&self, key: &str) {
        self.breaker.record_failure(key).await;

        let mut state = self.state.lock().await;
        let metrics = state.metrics.entry(key.to_string()).or_default();
        metrics.last_failure_time = Some(Instant::now());
    }

    /// Snapshot of the key's metrics (zeroed defaults for an unseen key)
    pub async fn metrics(&self, key: &str) -> ActionMetrics {
        let state = self.state.lock().await;
        state.metrics.get(key).cloned().unwrap_or_default()
    }

    /// Restore the key's bucket, circuit, and metrics to defaults
    ///
    /// The key stays in each map.
    pub async fn reset(&self, key: &str) {
        self.limiter.reset(key).await;
        self.breaker.reset(key).await;

        let mut state = self.state.lock().await;
        state.metrics.insert(key.to_string(), ActionMetrics::default());
    }

    /// Global kill switch: while disabled, every check fails
    pub async fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        state.enabled = enabled;
        info!(enabled, "resource protection toggled");
    }

    /// Whether the protector is currently enabled
    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.enabled
    }

    /// Install per-key rate-limiter tuning
    pub async fn configure_rate_limit(&self, key: &str, config: BucketConfig) {
        self.limiter.configure(key, config).await;
    }

    /// Install per-key circuit-breaker tuning
    pub async fn configure_breaker(&self, key: &str, config: BreakerConfig) {
        self.breaker.configure(key, config).await;
    }

    /// Current circuit state for the key (side-effecting read, see breaker docs)
    pub async fn circuit_state(&self, key: &str) -> CircuitState {
        self.breaker.state(key).await
    }

    /// Tokens currently available for the key
    pub async fn remaining_tokens(&self, key: &str) -> u32 {
        self.limiter.remaining_tokens(key).await
    }

    /// Run `op` under protection: check the gate, execute, record the outcome
    ///
    /// The gate is released before `op` runs, so a slow operation does not
    /// block unrelated checks. The operation's own error is returned after
    /// being recorded as a failure.
    pub async fn execute_protected<F, Fut, T, E>(
        &self,
        key: &str,
        op: F,
    ) -> Result<T, ProtectedCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.check_action(key).await?;

        match op().await {
            Ok(value) => {
                self.record_success(key).await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure(key).await;
                Err(ProtectedCallError::Operation(err))
            }
        }
    }
}
