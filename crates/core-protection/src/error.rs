//! Error types for the protection layer
//!
//! Every variant here is a *gate rejection*: it is raised before the guarded
//! operation runs, carries no side effects on the underlying action, and is
//! always recoverable by retrying later.

use crate::circuit_breaker::CircuitState;
use std::time::Duration;

/// Reasons the protection layer can refuse to admit an action
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtectionError {
    /// The action's token bucket is empty
    #[error("action '{key}' is rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Key of the rejected action
        key: String,
        /// Informational estimate of when a token will be available
        retry_after: Duration,
    },

    /// The action's circuit is open after repeated failures
    #[error("action '{key}' is unavailable (circuit {state})")]
    CircuitOpen {
        /// Key of the rejected action
        key: String,
        /// Circuit state observed at rejection time
        state: CircuitState,
    },

    /// A shared resource budget has been exhausted
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),

    /// The global kill switch is off
    #[error("resource protection is disabled")]
    ProtectionDisabled,
}

/// Outcome of [`ResourceProtector::execute_protected`](crate::ResourceProtector::execute_protected)
///
/// Separates "the gate refused to run the operation" from "the operation ran
/// and failed", so callers can tell whether the underlying action was ever
/// attempted.
#[derive(Debug, thiserror::Error)]
pub enum ProtectedCallError<E> {
    /// The gate rejected the call; the operation never ran
    #[error(transparent)]
    Rejected(#[from] ProtectionError),

    /// The operation ran and returned its own error (already recorded as a failure)
    #[error(transparent)]
    Operation(E),
}
