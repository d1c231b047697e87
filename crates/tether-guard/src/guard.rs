//! Guarded execution of a security-response batch
//!
//! The guard enforces single-flight: one [`ExecutionRequest`] at a time per
//! instance, with concurrent submissions rejected immediately — queueing a
//! second wave of lock/alarm/shutdown behind the first helps no one. Admitted
//! requests run through one of two strategies:
//!
//! - **Sequential** (default): lock-screen first if enabled, remaining
//!   actions in submission order. A failure never stops the remaining
//!   actions — partial coverage beats none.
//! - **Parallel**: every enabled action fans out concurrently; results are
//!   collected as they complete, and one sibling's failure cancels nothing.
//!
//! The in-flight flag is an atomic, not a lock held across awaits, so
//! `is_executing` and `stop_ongoing_actions` stay responsive while a slow
//! repository call is in progress.

use crate::action::SecurityAction;
use crate::error::GuardError;
use crate::policy::ProtectionPolicy;
use crate::repository::SecurityActionRepository;
use crate::request::{ActionOutcome, ExecutionRequest, ExecutionResult};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Single-flight executor for security-response batches
pub struct ExecutionGuard {
    repository: Arc<dyn SecurityActionRepository>,
    policy: ProtectionPolicy,
    executing: AtomicBool,
}

impl ExecutionGuard {
    /// Create a guard driving the given platform repository under the given policy
    pub fn new(repository: Arc<dyn SecurityActionRepository>, policy: ProtectionPolicy) -> Self {
        Self {
            repository,
            policy,
            executing: AtomicBool::new(false),
        }
    }

    /// Execute a batch of security responses. Never returns an error: every
    /// outcome, including outright rejection, is carried in the result.
    pub async fn execute(&self, mut request: ExecutionRequest) -> ExecutionResult {
        request.sanitize();
        let started_at = Utc::now();

        // Single-flight admission: lose the race, get an immediate rejection
        // without touching the protector or the repository.
        if self
            .executing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(trigger = %request.trigger, "rejecting request: execution already in progress");
            let rejected = request
                .enabled_actions
                .first()
                .copied()
                .unwrap_or(SecurityAction::LockScreen);
            return ExecutionResult {
                request,
                executed: vec![ActionOutcome::failed(rejected, GuardError::AlreadyExecuting)],
                started_at,
                finished_at: Utc::now(),
            };
        }

        info!(
            trigger = %request.trigger,
            actions = request.enabled_actions.len(),
            parallel = request.execute_in_parallel,
            "executing security response batch"
        );

        if request.action_delay > Duration::ZERO {
            debug!(delay_ms = request.action_delay.as_millis() as u64, "delaying batch");
            tokio::time::sleep(request.action_delay).await;
        }

        let executed = if request.execute_in_parallel {
            self.run_parallel(&request).await
        } else {
            self.run_sequential(&request).await
        };

        self.executing.store(false, Ordering::SeqCst);

        let result = ExecutionResult {
            request,
            executed,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            succeeded = result.all_succeeded(),
            failed = result.failed_actions().len(),
            duration_ms = result.duration().as_millis() as u64,
            "security response batch finished"
        );
        result
    }

    /// Whether a batch is currently in flight
    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }

    /// Stop the alarm, regardless of whether a batch is executing
    ///
    /// Targets the alarm resource only; it does not touch the single-flight
    /// flag or any other in-flight action.
    pub async fn stop_ongoing_actions(&self) {
        info!("stopping ongoing alarm");
        self.repository.stop_alarm().await;
    }

    /// Lock-screen first if enabled, everything else in submission order,
    /// never short-circuiting on failure
    async fn run_sequential(&self, request: &ExecutionRequest) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(request.enabled_actions.len());
        for action in sequential_order(&request.enabled_actions) {
            outcomes.push(self.run_action(action, request).await);
        }
        outcomes
    }

    /// Fan out every enabled action, collect in completion order
    async fn run_parallel(&self, request: &ExecutionRequest) -> Vec<ActionOutcome> {
        request
            .enabled_actions
            .iter()
            .map(|action| self.run_action(*action, request))
            .collect::<FuturesUnordered<_>>()
            .collect()
            .await
    }

    /// Gate one action, dispatch it, and record its outcome
    async fn run_action(
        &self,
        action: SecurityAction,
        request: &ExecutionRequest,
    ) -> ActionOutcome {
        if let Err(err) = self.policy.validate_action(action).await {
            return ActionOutcome::failed(action, err);
        }

        match self.dispatch(action, request).await {
            Ok(()) => {
                self.policy.record_success(action).await;
                info!(action = %action, "action completed");
                ActionOutcome::succeeded(action)
            }
            Err(err) => {
                self.policy.record_failure(action).await;
                warn!(action = %action, %err, "action failed");
                ActionOutcome::failed(action, err)
            }
        }
    }

    /// The per-action repository dispatch table
    async fn dispatch(
        &self,
        action: SecurityAction,
        request: &ExecutionRequest,
    ) -> Result<(), GuardError> {
        match action {
            SecurityAction::LockScreen => self.repository.lock_screen().await,
            SecurityAction::SoundAlarm => self.repository.play_alarm(request.alarm_volume).await,
            SecurityAction::ForceLogout => self.repository.force_logout().await,
            SecurityAction::Shutdown => {
                self.repository
                    .schedule_shutdown(request.shutdown_delay)
                    .await
            }
            SecurityAction::CustomScript => match &request.custom_script_path {
                Some(path) => self.repository.execute_script(path).await,
                // No configured script: fail without touching the repository
                None => Err(GuardError::ScriptNotFound {
                    path: PathBuf::new(),
                }),
            },
        }
    }
}

/// Sequential priority: lock-screen jumps the queue, the rest keep their order
fn sequential_order(actions: &[SecurityAction]) -> Vec<SecurityAction> {
    let mut ordered = Vec::with_capacity(actions.len());
    if actions.contains(&SecurityAction::LockScreen) {
        ordered.push(SecurityAction::LockScreen);
    }
    ordered.extend(
        actions
            .iter()
            .copied()
            .filter(|action| *action != SecurityAction::LockScreen),
    );
    ordered
}
