//! Keyed token-bucket rate limiting
//!
//! Each action key owns an independent token bucket. Tokens accrue over time
//! up to a fixed capacity and one token is consumed per admitted call. Buckets
//! are created lazily at full capacity, so the first trigger after startup is
//! never penalized.
//!
//! Call volume here is human-trigger-rate, so the whole key map sits behind a
//! single `tokio::sync::Mutex` rather than finer-grained locking.
//!
//! # Example
//!
//! ```
//! use tether_core_protection::rate_limiter::{BucketConfig, RateLimiter};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let limiter = RateLimiter::new();
//! limiter
//!     .configure(
//!         "lock_screen",
//!         BucketConfig {
//!             capacity: 2,
//!             refill_rate: Duration::from_secs(2),
//!             retry_hint: Duration::from_secs(2),
//!         },
//!     )
//!     .await;
//!
//! assert!(limiter.allow_action("lock_screen").await);
//! assert!(limiter.allow_action("lock_screen").await);
//! assert!(!limiter.allow_action("lock_screen").await); // bucket drained
//! # });
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Per-key token bucket tuning
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// Maximum number of tokens the bucket can hold
    pub capacity: u32,

    /// Time to accrue one token
    pub refill_rate: Duration,

    /// Informational retry-after estimate surfaced when the bucket is empty
    pub retry_hint: Duration,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            refill_rate: Duration::from_secs(5),
            retry_hint: Duration::from_secs(5),
        }
    }
}

/// A single token bucket
#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
    config: BucketConfig,
}

impl TokenBucket {
    /// Seed a new bucket at full capacity — no cold-start penalty
    fn new(config: BucketConfig) -> Self {
        Self {
            tokens: config.capacity,
            last_refill: Instant::now(),
            config,
        }
    }

    /// Credit tokens accrued since the last refill: `floor(elapsed / refill_rate)`
    fn refill(&mut self, now: Instant) {
        let rate_ms = self.config.refill_rate.as_millis().max(1);
        let elapsed_ms = now.saturating_duration_since(self.last_refill).as_millis();
        let tokens_to_add = (elapsed_ms / rate_ms) as u32;

        if tokens_to_add > 0 {
            self.tokens = (self.tokens + tokens_to_add).min(self.config.capacity);
            self.last_refill = now;
        }
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Internal state: lazily-populated buckets plus per-key configuration overrides
#[derive(Debug, Default)]
struct RateLimiterState {
    buckets: HashMap<String, TokenBucket>,
    configs: HashMap<String, BucketConfig>,
    default_config: BucketConfig,
}

impl RateLimiterState {
    fn config_for(&self, key: &str) -> BucketConfig {
        self.configs
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    fn bucket_mut(&mut self, key: &str) -> &mut TokenBucket {
        let config = self.config_for(key);
        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(config))
    }
}

/// Token-bucket admission control across a set of action keys
///
/// All operations on one instance are mutually exclusive, including across
/// distinct keys sharing the map.
#[derive(Debug, Default)]
pub struct RateLimiter {
    state: Mutex<RateLimiterState>,
}

impl RateLimiter {
    /// Create a limiter where unconfigured keys use [`BucketConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a limiter with a custom fallback config for unconfigured keys
    pub fn with_default_config(default_config: BucketConfig) -> Self {
        Self {
            state: Mutex::new(RateLimiterState {
                default_config,
                ..Default::default()
            }),
        }
    }

    /// Refill the key's bucket, then consume one token if available
    pub async fn allow_action(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        let bucket = state.bucket_mut(key);
        bucket.refill(Instant::now());

        let allowed = bucket.try_consume();
        if !allowed {
            debug!(key, "rate limiter denied action: bucket empty");
        }
        allowed
    }

    /// Tokens currently available for the key (refills before reading)
    pub async fn remaining_tokens(&self, key: &str) -> u32 {
        let mut state = self.state.lock().await;
        let bucket = state.bucket_mut(key);
        bucket.refill(Instant::now());
        bucket.tokens
    }

    /// Retry-after estimate for the key, from its configuration
    pub async fn retry_hint(&self, key: &str) -> Duration {
        let state = self.state.lock().await;
        state.config_for(key).retry_hint
    }

    /// Install per-key tuning; an existing bucket is re-seeded at the new capacity
    pub async fn configure(&self, key: &str, config: BucketConfig) {
        let mut state = self.state.lock().await;
        state.configs.insert(key.to_string(), config.clone());
        if state.buckets.contains_key(key) {
            state
                .buckets
                .insert(key.to_string(), TokenBucket::new(config));
        }
    }

    /// Restore the key's bucket to full capacity (entry stays in the map)
    pub async fn reset(&self, key: &str) {
        let mut state = self.state.lock().await;
        let config = state.config_for(key);
        if let Some(bucket) = state.buckets.get_mut(key) {
            *bucket = TokenBucket::new(config);
        }
    }

    /// Restore every known bucket to full capacity
    pub async fn reset_all(&self) {
        let mut state = self.state.lock().await;
        let keys: Vec<String> = state.buckets.keys().cloned().collect();
        for key in keys {
            let config = state.config_for(&key);
            state.buckets.insert(key, TokenBucket::new(config));
        }
    }
}
