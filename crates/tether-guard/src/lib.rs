//! Tether Guard: guarded execution of security responses
//!
//! # Overview
//!
//! This crate is the domain layer between Tether's trigger sources (power
//! monitoring, panic button) and the platform code that actually locks,
//! alarms, logs out, and shuts down. It decides *whether and how* those
//! irreversible actions run:
//!
//! - **Single-flight**: one [`ExecutionRequest`] at a time per
//!   [`ExecutionGuard`]; concurrent submissions are rejected, not queued
//! - **Protection policy**: every action passes the
//!   [`tether_core_protection`] gate (kill switch → circuit breaker → token
//!   bucket) before its repository call, with per-action default tuning
//! - **Strategies**: sequential (lock-screen first, failures never stop the
//!   rest) or parallel (fan-out, no sibling cancellation)
//! - **Full accounting**: [`ExecutionGuard::execute`] never fails — every
//!   outcome lands in the [`ExecutionResult`]
//!
//! Platform effects live behind [`SecurityActionRepository`]; this crate
//! never touches the operating system directly.
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether_guard::{
//!     ExecutionGuard, ExecutionRequest, ProtectionPolicy, SecurityAction,
//!     SecurityActionRepository, TriggerSource,
//! };
//!
//! # async fn example(repository: Arc<dyn SecurityActionRepository>) {
//! let guard = ExecutionGuard::new(repository, ProtectionPolicy::new().await);
//!
//! let request = ExecutionRequest::new(
//!     TriggerSource::PowerAdapterDisconnected,
//!     vec![SecurityAction::LockScreen, SecurityAction::SoundAlarm],
//! );
//!
//! let result = guard.execute(request).await;
//! if !result.all_succeeded() {
//!     // escalate or fall back; nothing here is fatal
//! }
//! # }
//! ```

pub mod action;
pub mod error;
pub mod guard;
pub mod policy;
pub mod repository;
pub mod request;

// Re-export main types for convenience
pub use action::{SecurityAction, TriggerSource};
pub use error::GuardError;
pub use guard::ExecutionGuard;
pub use policy::ProtectionPolicy;
pub use repository::SecurityActionRepository;
pub use request::{ActionOutcome, ExecutionRequest, ExecutionResult};

// The protection primitives are part of this crate's public surface
pub use tether_core_protection::{
    ActionMetrics, BreakerConfig, BucketConfig, CircuitState, ProtectionError, ResourceProtector,
};
