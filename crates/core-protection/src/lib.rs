//! Tether Core Protection: Pure-logic admission control primitives
//!
//! # Overview
//!
//! This crate decides *whether* a guarded action may run — never *how* it
//! runs. It provides the building blocks Tether uses to keep irreversible
//! security responses (lock screen, alarm, logout, shutdown, scripts) from
//! firing repeatedly, concurrently, or while previously failing:
//!
//! - **Rate Limiter**: keyed token buckets — permits accrue over time up to a
//!   capacity, one consumed per admitted call
//! - **Circuit Breaker**: keyed closed/open/half-open machine that stops
//!   invoking a repeatedly-failing action until a cool-down elapses
//! - **Resource Protector**: the coordinator composing both behind a fixed
//!   gate order, with per-key metrics and a global kill switch
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - What the guarded actions actually do (platform APIs, scripts)
//! - How triggers are produced (power events, manual arming)
//! - Application-specific error taxonomies
//!
//! Action identity is a plain string key; the domain layer maps its own enums
//! onto keys and translates [`ProtectionError`] into its own error types.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (tether-guard)      │
//! └─────────────┬───────────────────────────┘
//!               │ check_action(key)
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Enable Check                      │  ← Global kill switch
//! └─────────────┬───────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Circuit Breaker                   │  ← Fail fast on known-bad keys
//! │  (closed / open / half-open per key)    │
//! └─────────────┬───────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Rate Limiter                      │  ← Token bucket per key
//! │  (consume one token if available)       │
//! └─────────────┬───────────────────────────┘
//!               │ admitted
//!               ▼
//!         Guarded Action
//!               │
//!       record_success / record_failure
//!               │
//!               ▼
//!     Breaker state + per-key metrics
//! ```
//!
//! # Usage Example
//!
//! ```
//! use tether_core_protection::{ProtectionError, ResourceProtector};
//!
//! # tokio_test::block_on(async {
//! let protector = ResourceProtector::new();
//!
//! match protector.check_action("lock_screen").await {
//!     Ok(()) => {
//!         // run the action, then:
//!         protector.record_success("lock_screen").await;
//!     }
//!     Err(ProtectionError::RateLimited { retry_after, .. }) => {
//!         // informational: when to try again
//!         let _ = retry_after;
//!     }
//!     Err(_) => { /* circuit open or protection disabled */ }
//! }
//! # });
//! ```

pub mod circuit_breaker;
pub mod error;
pub mod metrics;
pub mod protector;
pub mod rate_limiter;

// Re-export main types for convenience
pub use circuit_breaker::{BreakerConfig, CircuitBreaker, CircuitState};
pub use error::{ProtectedCallError, ProtectionError};
pub use metrics::ActionMetrics;
pub use protector::ResourceProtector;
pub use rate_limiter::{BucketConfig, RateLimiter};

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use tether_core_protection::prelude::*;
/// ```
pub mod prelude {
    pub use super::circuit_breaker::{BreakerConfig, CircuitBreaker, CircuitState};
    pub use super::error::{ProtectedCallError, ProtectionError};
    pub use super::metrics::ActionMetrics;
    pub use super::protector::ResourceProtector;
    pub use super::rate_limiter::{BucketConfig, RateLimiter};
}
