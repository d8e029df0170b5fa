//! Queue fixtures for testing.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracksync_engine::{
    ConflictEvent, Credential, EventKind, QueueConfig, Subscription, SyncEvent, SyncQueue,
    SyncStatus,
};
use tracksync_vcs::MockVcs;

/// Token installed by [`TestQueue::with_token`].
pub const TEST_TOKEN: &str = "test-token";

/// Upper bound on the (virtual) time [`TestQueue::wait_until`] waits.
pub const WAIT_LIMIT: Duration = Duration::from_secs(600);

/// Returns the configuration used by [`TestQueue::new`]: default debounce
/// and retry policy, no periodic push.
pub fn test_config() -> QueueConfig {
    QueueConfig::new(".").without_periodic_push()
}

/// A sync queue over a [`MockVcs`] that records every event it emits.
///
/// Must be created inside a tokio runtime. Timers are stopped when the
/// harness is dropped.
pub struct TestQueue {
    queue: SyncQueue<MockVcs>,
    vcs: Arc<MockVcs>,
    subscription: Subscription,
    log: Mutex<Vec<SyncEvent>>,
}

impl TestQueue {
    /// Creates a harness with [`test_config`].
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Creates a harness with the given configuration.
    pub fn with_config(config: QueueConfig) -> Self {
        let vcs = Arc::new(MockVcs::new());
        let queue = SyncQueue::new(config, Arc::clone(&vcs))
            .expect("TestQueue must be created inside a tokio runtime");
        let subscription = queue.subscribe(None);
        Self {
            queue,
            vcs,
            subscription,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Installs [`TEST_TOKEN`] as the credential.
    pub fn with_token(self) -> Self {
        self.queue.set_token(Some(Credential::new(TEST_TOKEN)));
        self
    }

    /// Returns the queue under test.
    pub fn queue(&self) -> &SyncQueue<MockVcs> {
        &self.queue
    }

    /// Returns the scripted port.
    pub fn vcs(&self) -> &MockVcs {
        &self.vcs
    }

    /// Returns every event emitted since the harness was created.
    pub fn events(&self) -> Vec<SyncEvent> {
        let mut log = self.log.lock();
        log.extend(self.subscription.drain());
        log.clone()
    }

    /// Returns the kinds of all recorded events, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(SyncEvent::kind).collect()
    }

    /// Returns the statuses carried by recorded `StatusChange` events.
    pub fn statuses(&self) -> Vec<SyncStatus> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::StatusChange { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Returns the messages of recorded `SyncError` events.
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::SyncError { error, .. } => Some(error),
                _ => None,
            })
            .collect()
    }

    /// Returns the recorded `Conflict` events.
    pub fn conflicts(&self) -> Vec<ConflictEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::Conflict(conflict) => Some(conflict),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of `SyncComplete` events recorded.
    pub fn completions(&self) -> usize {
        self.kinds()
            .iter()
            .filter(|kind| **kind == EventKind::SyncComplete)
            .count()
    }

    /// Returns the timestamp of the latest `SyncComplete` event.
    pub fn last_completion(&self) -> Option<DateTime<Utc>> {
        self.events().into_iter().rev().find_map(|event| match event {
            SyncEvent::SyncComplete { timestamp } => Some(timestamp),
            _ => None,
        })
    }

    /// Lets spawned tasks run without advancing time.
    pub async fn settle(&self) {
        for _ in 0..64 {
            tokio::task::yield_now().await;
        }
    }

    /// Waits in 1ms steps until `condition` holds.
    ///
    /// Under a paused clock each step advances virtual time, so pending
    /// timers fire along the way.
    ///
    /// # Panics
    ///
    /// Panics if the condition does not hold within [`WAIT_LIMIT`].
    pub async fn wait_until(&self, condition: impl Fn(&Self) -> bool) {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        while !condition(self) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached within {WAIT_LIMIT:?}; events: {:?}",
                self.kinds()
            );
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl Default for TestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestQueue {
    type Target = SyncQueue<MockVcs>;

    fn deref(&self) -> &Self::Target {
        &self.queue
    }
}

impl Drop for TestQueue {
    fn drop(&mut self) {
        self.queue.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn harness_records_events() {
        let harness = TestQueue::new().with_token();
        assert!(harness.has_token());

        harness.enqueue_push();
        harness.wait_until(|h| h.completions() == 1).await;

        assert_eq!(
            harness.statuses(),
            vec![SyncStatus::Syncing, SyncStatus::Idle]
        );
        assert_eq!(harness.vcs().push_count(), 1);
        assert!(harness.last_completion().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_does_not_advance_time() {
        let harness = TestQueue::new();
        harness.enqueue_commit("edit");

        let before = tokio::time::Instant::now();
        harness.settle().await;

        assert_eq!(tokio::time::Instant::now(), before);
        assert!(harness.events().is_empty());
        assert_eq!(harness.state().pending_jobs, 1);
    }
}
