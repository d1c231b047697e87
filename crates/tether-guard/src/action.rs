//! Security action taxonomy
//!
//! The closed set of responses Tether can execute when an armed machine loses
//! its power adapter. Each action has a stable string key correlating it
//! across the rate-limiter, circuit-breaker, and metrics maps.

use serde::{Deserialize, Serialize};

/// A security response Tether can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAction {
    /// Lock the screen immediately
    LockScreen,
    /// Play the theft alarm at a configured volume
    SoundAlarm,
    /// Force the current user session to log out
    ForceLogout,
    /// Schedule a system shutdown after a delay
    Shutdown,
    /// Run a user-provided script
    CustomScript,
}

impl SecurityAction {
    /// Stable key used across all protection maps
    pub fn key(&self) -> &'static str {
        match self {
            SecurityAction::LockScreen => "lock_screen",
            SecurityAction::SoundAlarm => "sound_alarm",
            SecurityAction::ForceLogout => "force_logout",
            SecurityAction::Shutdown => "shutdown",
            SecurityAction::CustomScript => "custom_script",
        }
    }

    /// All actions, in default execution order
    pub fn all() -> [SecurityAction; 5] {
        [
            SecurityAction::LockScreen,
            SecurityAction::SoundAlarm,
            SecurityAction::ForceLogout,
            SecurityAction::Shutdown,
            SecurityAction::CustomScript,
        ]
    }
}

impl std::fmt::Display for SecurityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// What caused an execution request to be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// The power adapter was disconnected while armed
    PowerAdapterDisconnected,
    /// The user asked for the responses to run (e.g. panic button)
    Manual,
    /// A dry run exercising the pipeline without a real theft signal
    Test,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::PowerAdapterDisconnected => write!(f, "power adapter disconnected"),
            TriggerSource::Manual => write!(f, "manual"),
            TriggerSource::Test => write!(f, "test"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let keys: std::collections::HashSet<&str> =
            SecurityAction::all().iter().map(|a| a.key()).collect();
        assert_eq!(keys.len(), SecurityAction::all().len());
    }

    #[test]
    fn test_display_matches_key() {
        assert_eq!(SecurityAction::LockScreen.to_string(), "lock_screen");
        assert_eq!(SecurityAction::Shutdown.to_string(), "shutdown");
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(
            TriggerSource::PowerAdapterDisconnected.to_string(),
            "power adapter disconnected"
        );
    }
}
