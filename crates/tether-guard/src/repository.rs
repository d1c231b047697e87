//! The platform boundary
//!
//! Everything that actually touches the operating system — locking the
//! screen, playing sound, logging out, shutting down, spawning scripts —
//! lives behind this trait. The guard only ever sees `Result`s.

use crate::error::GuardError;
use std::path::Path;
use std::time::Duration;

/// Platform implementations of Tether's security responses
///
/// Implementations must be safe to call from concurrent tasks: the parallel
/// strategy fans out one call per enabled action, and `stop_alarm` may arrive
/// while another call is still in flight.
#[async_trait::async_trait]
pub trait SecurityActionRepository: Send + Sync {
    /// Lock the screen immediately
    async fn lock_screen(&self) -> Result<(), GuardError>;

    /// Start the theft alarm at the given volume (`0.0..=1.0`)
    async fn play_alarm(&self, volume: f32) -> Result<(), GuardError>;

    /// Stop the alarm if it is playing; must never fail
    async fn stop_alarm(&self);

    /// Force the current session to log out
    async fn force_logout(&self) -> Result<(), GuardError>;

    /// Schedule a system shutdown after the given grace period
    async fn schedule_shutdown(&self, after: Duration) -> Result<(), GuardError>;

    /// Run the user-provided script at `path`
    async fn execute_script(&self, path: &Path) -> Result<(), GuardError>;
}
