//! Protection policy: the bridge between gate outcomes and domain errors
//!
//! Wraps a [`ResourceProtector`] keyed by [`SecurityAction::key`] and
//! translates its low-level rejections into the domain taxonomy. Also owns
//! the per-action default tuning: the cheap, reversible `lock_screen` gets
//! the most permissive bucket, the destructive `shutdown` the strictest.

use crate::action::SecurityAction;
use crate::error::GuardError;
use std::sync::Arc;
use std::time::Duration;
use tether_core_protection::{
    ActionMetrics, BreakerConfig, BucketConfig, ProtectionError, ResourceProtector,
};
use tracing::debug;

/// Per-action default tuning, tightest first
///
/// | Action | Bucket | Refill | Breaker (fail/success) | Cool-down |
/// |---|---|---|---|---|
/// | lock_screen | 5 | 2 s | 5 / 2 | 30 s |
/// | sound_alarm | 3 | 5 s | 4 / 2 | 60 s |
/// | custom_script | 2 | 10 s | 3 / 2 | 60 s |
/// | force_logout | 2 | 30 s | 3 / 2 | 90 s |
/// | shutdown | 1 | 60 s | 2 / 2 | 120 s |
///
/// The retry hint surfaced by `RateLimited` matches each action's refill rate.
fn default_tuning(action: SecurityAction) -> (BucketConfig, BreakerConfig) {
    let (capacity, refill_secs, failures, cooldown_secs) = match action {
        SecurityAction::LockScreen => (5, 2, 5, 30),
        SecurityAction::SoundAlarm => (3, 5, 4, 60),
        SecurityAction::CustomScript => (2, 10, 3, 60),
        SecurityAction::ForceLogout => (2, 30, 3, 90),
        SecurityAction::Shutdown => (1, 60, 2, 120),
    };

    (
        BucketConfig {
            capacity,
            refill_rate: Duration::from_secs(refill_secs),
            retry_hint: Duration::from_secs(refill_secs),
        },
        BreakerConfig {
            failure_threshold: failures,
            success_threshold: 2,
            timeout: Duration::from_secs(cooldown_secs),
        },
    )
}

/// Domain-facing adapter over the resource protector
#[derive(Debug, Clone)]
pub struct ProtectionPolicy {
    protector: Arc<ResourceProtector>,
}

impl ProtectionPolicy {
    /// Create a policy with a fresh protector and per-action defaults installed
    pub async fn new() -> Self {
        let policy = Self::with_protector(Arc::new(ResourceProtector::new()));
        for action in SecurityAction::all() {
            let (bucket, breaker) = default_tuning(action);
            policy
                .protector
                .configure_rate_limit(action.key(), bucket)
                .await;
            policy
                .protector
                .configure_breaker(action.key(), breaker)
                .await;
        }
        policy
    }

    /// Wrap an existing protector as-is (no defaults installed)
    pub fn with_protector(protector: Arc<ResourceProtector>) -> Self {
        Self { protector }
    }

    /// The underlying protector, for per-key tuning or direct introspection
    pub fn protector(&self) -> &Arc<ResourceProtector> {
        &self.protector
    }

    /// Gate check for one action, in domain terms
    pub async fn validate_action(&self, action: SecurityAction) -> Result<(), GuardError> {
        match self.protector.check_action(action.key()).await {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(action = %action, %err, "protection rejected action");
                Err(translate(action, err))
            }
        }
    }

    /// Record a successful execution for the action
    pub async fn record_success(&self, action: SecurityAction) {
        self.protector.record_success(action.key()).await;
    }

    /// Record a failed execution for the action
    pub async fn record_failure(&self, action: SecurityAction) {
        self.protector.record_failure(action.key()).await;
    }

    /// Metrics snapshot for the action
    pub async fn metrics(&self, action: SecurityAction) -> ActionMetrics {
        self.protector.metrics(action.key()).await
    }

    /// Reset the action's bucket, circuit, and metrics
    pub async fn reset(&self, action: SecurityAction) {
        self.protector.reset(action.key()).await;
    }

    /// Flip the global kill switch
    pub async fn set_enabled(&self, enabled: bool) {
        self.protector.set_enabled(enabled).await;
    }
}

/// Map a gate rejection into the domain taxonomy
fn translate(action: SecurityAction, err: ProtectionError) -> GuardError {
    match err {
        ProtectionError::RateLimited { retry_after, .. } => GuardError::ActionFailed {
            action,
            reason: format!("rate limited, retry after {}s", retry_after.as_secs()),
        },
        ProtectionError::CircuitOpen { .. } => GuardError::ActionFailed {
            action,
            reason: "temporarily unavailable".to_string(),
        },
        ProtectionError::ResourceExhausted(_) => GuardError::ActionFailed {
            action,
            reason: "resources exhausted".to_string(),
        },
        ProtectionError::ProtectionDisabled => {
            GuardError::SystemError("resource protection is disabled".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core_protection::CircuitState;

    #[tokio::test]
    async fn test_defaults_admit_first_use() {
        let policy = ProtectionPolicy::new().await;
        for action in SecurityAction::all() {
            assert!(policy.validate_action(action).await.is_ok(), "{action}");
        }
    }

    #[tokio::test]
    async fn test_shutdown_bucket_is_single_shot() {
        let policy = ProtectionPolicy::new().await;

        assert!(policy.validate_action(SecurityAction::Shutdown).await.is_ok());
        match policy.validate_action(SecurityAction::Shutdown).await {
            Err(GuardError::ActionFailed { action, reason }) => {
                assert_eq!(action, SecurityAction::Shutdown);
                assert_eq!(reason, "rate limited, retry after 60s");
            }
            other => panic!("expected rate-limited ActionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_circuit_translates_to_unavailable() {
        let policy = ProtectionPolicy::new().await;

        // Shutdown opens after two failures
        policy.record_failure(SecurityAction::Shutdown).await;
        policy.record_failure(SecurityAction::Shutdown).await;
        assert_eq!(
            policy.protector().circuit_state("shutdown").await,
            CircuitState::Open
        );

        match policy.validate_action(SecurityAction::Shutdown).await {
            Err(GuardError::ActionFailed { reason, .. }) => {
                assert_eq!(reason, "temporarily unavailable");
            }
            other => panic!("expected ActionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_disabled_translates_to_system_error() {
        let policy = ProtectionPolicy::new().await;
        policy.set_enabled(false).await;

        match policy.validate_action(SecurityAction::LockScreen).await {
            Err(GuardError::SystemError(msg)) => {
                assert_eq!(msg, "resource protection is disabled");
            }
            other => panic!("expected SystemError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_record_and_reset_round_trip() {
        let policy = ProtectionPolicy::new().await;

        policy.validate_action(SecurityAction::SoundAlarm).await.unwrap();
        policy.record_success(SecurityAction::SoundAlarm).await;

        let metrics = policy.metrics(SecurityAction::SoundAlarm).await;
        assert_eq!(metrics.total_attempts, 1);
        assert_eq!(metrics.successful_executions, 1);

        policy.reset(SecurityAction::SoundAlarm).await;
        let metrics = policy.metrics(SecurityAction::SoundAlarm).await;
        assert_eq!(metrics.total_attempts, 0);
    }
}
