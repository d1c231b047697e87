//! Guard execution integration test: the contested-laptop scenario
//!
//! Exercises the guard end to end the way the host app drives it:
//!
//! 1. Collision: two triggers fire at once; exactly one batch runs, the
//!    other is rejected immediately with `AlreadyExecuting`
//! 2. Observability: `is_executing` flips while a batch is in flight, and
//!    `stop_ongoing_actions` reaches the alarm mid-batch
//! 3. Timing: the batch delay is applied once and shows up in the result's
//!    wall-clock duration
//! 4. Admission over time: a drained single-token bucket admits again after
//!    its refill period

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_guard::{
    ExecutionGuard, ExecutionRequest, GuardError, ProtectionPolicy, ResourceProtector,
    SecurityAction, SecurityActionRepository, TriggerSource,
};

/// Repository that counts calls and can slow each action down
#[derive(Default)]
struct CountingRepository {
    action_calls: AtomicU32,
    stop_alarm_calls: AtomicU32,
    per_call_delay: Option<Duration>,
}

impl CountingRepository {
    fn slow(delay: Duration) -> Self {
        Self {
            per_call_delay: Some(delay),
            ..Default::default()
        }
    }

    async fn touch(&self) -> Result<(), GuardError> {
        if let Some(delay) = self.per_call_delay {
            tokio::time::sleep(delay).await;
        }
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait::async_trait]
impl SecurityActionRepository for CountingRepository {
    async fn lock_screen(&self) -> Result<(), GuardError> {
        self.touch().await
    }

    async fn play_alarm(&self, _volume: f32) -> Result<(), GuardError> {
        self.touch().await
    }

    async fn stop_alarm(&self) {
        self.stop_alarm_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn force_logout(&self) -> Result<(), GuardError> {
        self.touch().await
    }

    async fn schedule_shutdown(&self, _after: Duration) -> Result<(), GuardError> {
        self.touch().await
    }

    async fn execute_script(&self, _path: &Path) -> Result<(), GuardError> {
        self.touch().await
    }
}

fn request(actions: Vec<SecurityAction>) -> ExecutionRequest {
    ExecutionRequest::new(TriggerSource::PowerAdapterDisconnected, actions)
}

#[tokio::test]
async fn test_single_flight_collision() {
    let repository = Arc::new(CountingRepository::default());
    let guard = Arc::new(ExecutionGuard::new(
        repository.clone(),
        ProtectionPolicy::new().await,
    ));

    // First request holds the guard for at least 100ms before any action
    let mut first = request(vec![SecurityAction::LockScreen, SecurityAction::SoundAlarm]);
    first.action_delay = Duration::from_millis(100);

    let first_guard = guard.clone();
    let first_task = tokio::spawn(async move { first_guard.execute(first).await });

    // Let the first request win the flag, then collide
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(guard.is_executing());

    let second = guard
        .execute(request(vec![SecurityAction::LockScreen]))
        .await;

    // The loser gets exactly one AlreadyExecuting outcome, instantly
    assert_eq!(second.executed.len(), 1);
    assert_eq!(second.executed[0].action, SecurityAction::LockScreen);
    assert_eq!(
        second.executed[0].error,
        Some(GuardError::AlreadyExecuting)
    );

    // The winner completes its full batch
    let first_result = first_task.await.expect("task should not panic");
    assert!(first_result.all_succeeded());
    assert_eq!(first_result.executed.len(), 2);

    // Only the winner's actions reached the repository
    assert_eq!(repository.action_calls.load(Ordering::SeqCst), 2);
    assert!(!guard.is_executing());
}

#[tokio::test]
async fn test_stop_alarm_reachable_mid_batch() {
    let repository = Arc::new(CountingRepository::slow(Duration::from_millis(100)));
    let guard = Arc::new(ExecutionGuard::new(
        repository.clone(),
        ProtectionPolicy::new().await,
    ));

    let batch_guard = guard.clone();
    let batch = tokio::spawn(async move {
        batch_guard
            .execute(request(vec![SecurityAction::SoundAlarm]))
            .await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(guard.is_executing());

    // The alarm-specific stop is not blocked by the in-flight batch
    guard.stop_ongoing_actions().await;
    assert_eq!(repository.stop_alarm_calls.load(Ordering::SeqCst), 1);

    let result = batch.await.expect("task should not panic");
    assert!(result.all_succeeded());
}

#[tokio::test]
async fn test_batch_delay_counts_toward_duration() {
    let repository = Arc::new(CountingRepository::default());
    let guard = ExecutionGuard::new(repository, ProtectionPolicy::new().await);

    let mut delayed = request(vec![SecurityAction::LockScreen, SecurityAction::SoundAlarm]);
    delayed.action_delay = Duration::from_millis(100);

    let wall_start = Instant::now();
    let result = guard.execute(delayed).await;
    let wall_elapsed = wall_start.elapsed();

    assert!(result.all_succeeded());
    // One delay for the whole batch, not one per action
    assert!(result.duration() >= Duration::from_millis(100));
    assert!(result.duration() <= Duration::from_millis(150));
    // Result duration tracks real wall time
    assert!(wall_elapsed >= result.duration());
}

#[tokio::test]
async fn test_drained_bucket_admits_after_refill() {
    let repository = Arc::new(CountingRepository::default());
    let policy = ProtectionPolicy::with_protector(Arc::new(ResourceProtector::new()));
    policy
        .protector()
        .configure_rate_limit(
            SecurityAction::LockScreen.key(),
            tether_guard::BucketConfig {
                capacity: 1,
                refill_rate: Duration::from_secs(1),
                retry_hint: Duration::from_secs(1),
            },
        )
        .await;
    let guard = ExecutionGuard::new(repository.clone(), policy);

    // First call spends the only token, second is rate limited
    assert!(guard
        .execute(request(vec![SecurityAction::LockScreen]))
        .await
        .all_succeeded());
    let limited = guard
        .execute(request(vec![SecurityAction::LockScreen]))
        .await;
    assert!(!limited.all_succeeded());
    assert_eq!(repository.action_calls.load(Ordering::SeqCst), 1);

    // After the refill period a token is available again
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(guard
        .execute(request(vec![SecurityAction::LockScreen]))
        .await
        .all_succeeded());
    assert_eq!(repository.action_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sequential_priority_end_to_end() {
    let repository = Arc::new(CountingRepository::default());
    let guard = ExecutionGuard::new(repository, ProtectionPolicy::new().await);

    let result = guard
        .execute(request(vec![
            SecurityAction::SoundAlarm,
            SecurityAction::LockScreen,
            SecurityAction::Shutdown,
        ]))
        .await;

    assert!(result.all_succeeded());
    assert_eq!(result.executed[0].action, SecurityAction::LockScreen);
    assert_eq!(result.executed[1].action, SecurityAction::SoundAlarm);
    assert_eq!(result.executed[2].action, SecurityAction::Shutdown);
}
