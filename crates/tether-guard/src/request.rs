//! Execution requests and aggregated results
//!
//! An [`ExecutionRequest`] is one batch of security responses to run; an
//! [`ExecutionResult`] is the full accounting of what happened to each of
//! them. Results are always fully determined — no error ever escapes the
//! batch as a panic or early return.

use crate::action::{SecurityAction, TriggerSource};
use crate::error::GuardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One batch of security responses with its tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Actions to run, in submission order (deduplicated before execution)
    pub enabled_actions: Vec<SecurityAction>,

    /// Single delay applied once before the whole batch
    ///
    /// **Default:** 0 (immediate)
    pub action_delay: Duration,

    /// Alarm volume, clamped to `[0.0, 1.0]` before execution
    ///
    /// **Default:** 1.0 (full volume)
    pub alarm_volume: f32,

    /// Grace period passed to the shutdown action
    ///
    /// **Default:** 0
    pub shutdown_delay: Duration,

    /// Script to run for [`SecurityAction::CustomScript`], if any
    pub custom_script_path: Option<PathBuf>,

    /// Fan actions out concurrently instead of running them in sequence
    ///
    /// **Default:** false (sequential, lock-screen first)
    pub execute_in_parallel: bool,

    /// What produced this request
    pub trigger: TriggerSource,

    /// When the request was created
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRequest {
    /// Create a request for the given actions with default tuning
    pub fn new(trigger: TriggerSource, enabled_actions: Vec<SecurityAction>) -> Self {
        Self {
            enabled_actions,
            action_delay: Duration::ZERO,
            alarm_volume: 1.0,
            shutdown_delay: Duration::ZERO,
            custom_script_path: None,
            execute_in_parallel: false,
            trigger,
            timestamp: Utc::now(),
        }
    }

    /// Clamp and normalize the request in place
    ///
    /// Deduplicates `enabled_actions` preserving submission order and clamps
    /// `alarm_volume` into `[0, 1]`. A NaN volume becomes 1.0 — a too-loud
    /// alarm fails safer than a silent one.
    pub fn sanitize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.enabled_actions.retain(|action| seen.insert(*action));

        if self.alarm_volume.is_nan() {
            self.alarm_volume = 1.0;
        } else {
            self.alarm_volume = self.alarm_volume.clamp(0.0, 1.0);
        }
    }
}

impl Default for ExecutionRequest {
    fn default() -> Self {
        Self::new(TriggerSource::Manual, Vec::new())
    }
}

/// Outcome of one attempted action within a batch
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Which action this outcome belongs to
    pub action: SecurityAction,

    /// Whether the action completed successfully
    pub success: bool,

    /// The failure, when `success` is false
    pub error: Option<GuardError>,

    /// When the attempt finished
    pub executed_at: DateTime<Utc>,
}

impl ActionOutcome {
    /// A successful attempt
    pub fn succeeded(action: SecurityAction) -> Self {
        Self {
            action,
            success: true,
            error: None,
            executed_at: Utc::now(),
        }
    }

    /// A failed attempt
    pub fn failed(action: SecurityAction, error: GuardError) -> Self {
        Self {
            action,
            success: false,
            error: Some(error),
            executed_at: Utc::now(),
        }
    }
}

/// Aggregated accounting for one executed batch
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// The (sanitized) request this result answers
    pub request: ExecutionRequest,

    /// Per-action outcomes; ordered for the sequential strategy,
    /// completion-ordered for the parallel strategy
    pub executed: Vec<ActionOutcome>,

    /// When the batch started (before any delay)
    pub started_at: DateTime<Utc>,

    /// When the last action completed
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// True when every attempted action succeeded (vacuously true when empty)
    pub fn all_succeeded(&self) -> bool {
        self.executed.iter().all(|outcome| outcome.success)
    }

    /// The outcomes that failed
    pub fn failed_actions(&self) -> Vec<&ActionOutcome> {
        self.executed
            .iter()
            .filter(|outcome| !outcome.success)
            .collect()
    }

    /// Wall-clock duration of the batch
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
