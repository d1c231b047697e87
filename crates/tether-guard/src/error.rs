//! Domain error taxonomy for guarded execution
//!
//! Split along the same lines as the propagation policy: execution errors are
//! caught per action and recorded; `AlreadyExecuting` is a synchronous
//! single-flight short-circuit that never reaches the repository.

use crate::action::SecurityAction;
use std::path::PathBuf;

/// Errors produced while validating or executing security actions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GuardError {
    /// The action was attempted and failed, or was refused by protection
    #[error("action '{action}' failed: {reason}")]
    ActionFailed {
        /// Which action failed
        action: SecurityAction,
        /// Human-readable cause
        reason: String,
    },

    /// A custom script was requested but no path is configured, or the
    /// configured path does not exist
    #[error("script not found: {}", .path.display())]
    ScriptNotFound {
        /// The missing path (empty when none was configured)
        path: PathBuf,
    },

    /// The platform refused the operation
    #[error("permission denied for action '{action}'")]
    PermissionDenied {
        /// Which action was refused
        action: SecurityAction,
    },

    /// A failure outside any single action's control
    #[error("system error: {0}")]
    SystemError(String),

    /// The request itself is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Another request already holds the single-flight guard
    #[error("an execution is already in progress")]
    AlreadyExecuting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_failed_display() {
        let err = GuardError::ActionFailed {
            action: SecurityAction::SoundAlarm,
            reason: "rate limited, retry after 5s".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "action 'sound_alarm' failed: rate limited, retry after 5s"
        );
    }

    #[test]
    fn test_script_not_found_display() {
        let err = GuardError::ScriptNotFound {
            path: PathBuf::from("/tmp/response.sh"),
        };
        assert_eq!(err.to_string(), "script not found: /tmp/response.sh");
    }

    #[test]
    fn test_already_executing_display() {
        assert_eq!(
            GuardError::AlreadyExecuting.to_string(),
            "an execution is already in progress"
        );
    }
}
