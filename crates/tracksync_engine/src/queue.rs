//! The sync queue coordinator.
//!
//! Callers admit jobs through the `enqueue_*` methods. A single drain loop
//! per queue executes them one at a time on the tokio runtime, so callers
//! never block on network or subprocess I/O.

use crate::config::QueueConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{ConflictEvent, EventBus, EventKind, Subscription, SyncEvent};
use crate::job::{Job, JobKind, Resolution};
use crate::pending::PendingJobs;
use crate::state::{ConflictInfo, QueueState, SyncStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracksync_vcs::{BranchComparison, Credential, VersionControl};

/// Mutable queue state. Only the coordinator touches it.
#[derive(Debug, Default)]
pub(crate) struct Core {
    pub(crate) pending: PendingJobs,
    pub(crate) status: SyncStatus,
    pub(crate) last_sync: Option<DateTime<Utc>>,
    pub(crate) last_error: Option<String>,
    pub(crate) conflict: Option<ConflictInfo>,
    pub(crate) pending_changes: bool,
    pub(crate) credential: Option<Credential>,
    processing: bool,
    executing: Option<JobKind>,
}

impl Core {
    fn snapshot(&self) -> QueueState {
        QueueState {
            status: self.status,
            pending_jobs: self.pending.len(),
            last_sync: self.last_sync,
            last_error: self.last_error.clone(),
            conflict_info: self.conflict,
        }
    }
}

#[derive(Default)]
struct Timers {
    debounce: Option<JoinHandle<()>>,
    periodic: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_debounce();
        if let Some(handle) = self.periodic.take() {
            handle.abort();
        }
    }
}

pub(crate) struct Inner<V: VersionControl + 'static> {
    pub(crate) config: QueueConfig,
    pub(crate) vcs: Arc<V>,
    pub(crate) core: Mutex<Core>,
    pub(crate) events: EventBus,
    runtime: Handle,
    timers: Mutex<Timers>,
}

/// Batches local edits into commits and keeps them in sync with the remote.
///
/// Cloning a `SyncQueue` yields another handle to the same queue.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use tracksync_engine::{QueueConfig, SyncQueue};
/// use tracksync_vcs::{Credential, GitCli};
///
/// let config = QueueConfig::new("/srv/issues");
/// let queue = SyncQueue::new(config, Arc::new(GitCli::new("/srv/issues")))?;
/// queue.set_token(Some(Credential::new(token)));
///
/// // After every mutation of the working tree:
/// queue.enqueue_commit("Update issue #12");
/// ```
pub struct SyncQueue<V: VersionControl + 'static> {
    inner: Arc<Inner<V>>,
}

impl<V: VersionControl + 'static> Clone for SyncQueue<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: VersionControl + 'static> SyncQueue<V> {
    /// Creates a queue and starts its periodic push timer.
    ///
    /// Must be called from within a tokio runtime; the queue schedules its
    /// timers and drain loop on that runtime.
    pub fn new(config: QueueConfig, vcs: Arc<V>) -> SyncResult<Self> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let inner = Arc::new(Inner {
            config,
            vcs,
            core: Mutex::new(Core::default()),
            events: EventBus::new(),
            runtime,
            timers: Mutex::new(Timers::default()),
        });
        inner.start_periodic_push();
        Ok(Self { inner })
    }

    /// Returns the queue configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Returns the version-control port.
    pub fn vcs(&self) -> &Arc<V> {
        &self.inner.vcs
    }

    /// Queues a commit of the tracked subtree.
    ///
    /// Replaces any pending commit and restarts the debounce timer. Nothing
    /// runs until the timer fires.
    pub fn enqueue_commit(&self, message: impl Into<String>) {
        self.inner.enqueue_commit(message.into());
    }

    /// Queues a push unless one is already pending or running.
    pub fn enqueue_push(&self) {
        self.inner.enqueue_push();
    }

    /// Queues a pull ahead of pending commits and pushes unless one is
    /// already pending.
    pub fn enqueue_pull(&self) {
        self.inner.enqueue_pull();
    }

    /// Queues a conflict resolution ahead of every other job.
    ///
    /// Conflict state is cleared immediately, before the job runs.
    pub fn enqueue_resolve(&self, resolution: Resolution) {
        self.inner.enqueue_resolve(resolution);
    }

    /// Sets or clears the credential used for network jobs.
    pub fn set_token(&self, credential: Option<Credential>) {
        self.inner.core.lock().credential = credential;
    }

    /// Returns true if a credential is set.
    pub fn has_token(&self) -> bool {
        self.inner.core.lock().credential.is_some()
    }

    /// Returns true if committed changes have not been pushed yet.
    pub fn has_pending_changes(&self) -> bool {
        self.inner.core.lock().pending_changes
    }

    /// Leaves the conflict state. No-op unless the status is
    /// [`SyncStatus::Conflict`].
    pub fn clear_conflict(&self) {
        let inner = &self.inner;
        let mut core = inner.core.lock();
        if core.status != SyncStatus::Conflict {
            return;
        }
        core.conflict = None;
        core.last_error = None;
        inner.set_status(&mut core, SyncStatus::Idle);
    }

    /// Returns a snapshot of the queue state.
    pub fn state(&self) -> QueueState {
        self.inner.core.lock().snapshot()
    }

    /// Returns the jobs waiting to run, in execution order.
    pub fn pending(&self) -> Vec<Job> {
        self.inner.core.lock().pending.iter().cloned().collect()
    }

    /// Subscribes to queue events of `kind`, or to all events if `None`.
    pub fn subscribe(&self, kind: Option<EventKind>) -> Subscription {
        self.inner.events.subscribe(kind)
    }

    /// Cancels the debounce and periodic push timers.
    ///
    /// Jobs already admitted stay pending and run on the next trigger.
    /// Calling `stop` more than once is harmless.
    pub fn stop(&self) {
        self.inner.timers.lock().cancel_all();
        debug!("sync queue timers stopped");
    }
}

impl<V: VersionControl + 'static> Inner<V> {
    fn enqueue_commit(self: &Arc<Self>, message: String) {
        {
            let mut core = self.core.lock();
            if let Some(replaced) = core.pending.admit_commit(Job::commit(message)) {
                debug!(job = %replaced.id, "replaced pending commit");
            }
            core.pending_changes = true;
        }
        self.schedule_debounce();
    }

    pub(crate) fn enqueue_push(self: &Arc<Self>) {
        let admitted = {
            let mut core = self.core.lock();
            core.executing != Some(JobKind::Push) && core.pending.admit_push(Job::push())
        };
        if admitted {
            self.trigger();
        }
    }

    fn enqueue_pull(self: &Arc<Self>) {
        let admitted = self.core.lock().pending.admit_pull(Job::pull());
        if admitted {
            self.trigger();
        }
    }

    fn enqueue_resolve(self: &Arc<Self>, resolution: Resolution) {
        {
            let mut core = self.core.lock();
            core.pending.admit_resolve(Job::resolve(resolution));
            core.conflict = None;
            core.last_error = None;
            if core.status == SyncStatus::Conflict {
                self.set_status(&mut core, SyncStatus::Idle);
            }
        }
        info!(?resolution, "conflict resolution queued");
        self.trigger();
    }

    fn schedule_debounce(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let delay = self.config.debounce;
        let mut timers = self.timers.lock();
        timers.cancel_debounce();
        timers.debounce = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.trigger();
            }
        }));
    }

    fn start_periodic_push(self: &Arc<Self>) {
        let Some(interval) = self.config.push_interval else {
            return;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.periodic_push();
            }
        });

        let mut timers = self.timers.lock();
        if let Some(old) = timers.periodic.replace(handle) {
            old.abort();
        }
    }

    fn periodic_push(self: &Arc<Self>) {
        let due = {
            let core = self.core.lock();
            core.pending_changes && core.credential.is_some()
        };
        if due {
            debug!("periodic push due");
            self.enqueue_push();
        }
    }

    /// Starts the drain loop unless it is already running.
    fn trigger(self: &Arc<Self>) {
        {
            let mut core = self.core.lock();
            if core.processing {
                return;
            }
            core.processing = true;
        }
        let inner = Arc::clone(self);
        self.runtime.spawn(drain(inner));
    }

    /// Records a status, emitting an event only if it changed.
    pub(crate) fn set_status(&self, core: &mut Core, status: SyncStatus) {
        if core.status == status {
            return;
        }
        core.status = status;
        self.events.emit(SyncEvent::StatusChange {
            status,
            state: core.snapshot(),
        });
    }

    /// Records conflict state and returns the error failing the job.
    pub(crate) fn record_conflict(
        &self,
        comparison: BranchComparison,
        message: &str,
        has_conflicts: bool,
    ) -> SyncError {
        warn!(
            ahead = comparison.ahead,
            behind = comparison.behind,
            has_conflicts,
            "{}",
            message
        );
        let mut core = self.core.lock();
        core.conflict = Some(ConflictInfo {
            ahead: comparison.ahead,
            behind: comparison.behind,
        });
        core.last_error = Some(message.to_string());
        self.set_status(&mut core, SyncStatus::Conflict);
        self.events.emit(SyncEvent::Conflict(ConflictEvent {
            ahead: comparison.ahead,
            behind: comparison.behind,
            message: message.to_string(),
            has_conflicts,
        }));
        SyncError::Conflict {
            ahead: comparison.ahead,
            behind: comparison.behind,
        }
    }

    pub(crate) fn credential(&self) -> SyncResult<Credential> {
        self.core
            .lock()
            .credential
            .clone()
            .ok_or(SyncError::MissingCredential)
    }
}

/// Executes pending jobs until the list is empty.
///
/// The final transition to `Idle` and the completion event happen even when
/// the last job left the queue in `Error` or `Conflict`.
async fn drain<V: VersionControl + 'static>(inner: Arc<Inner<V>>) {
    {
        let mut core = inner.core.lock();
        inner.set_status(&mut core, SyncStatus::Syncing);
    }

    loop {
        let job = {
            let mut core = inner.core.lock();
            match core.pending.pop_front() {
                Some(job) => {
                    core.executing = Some(job.kind);
                    job
                }
                None => {
                    let timestamp = Utc::now();
                    core.processing = false;
                    core.executing = None;
                    core.last_sync = Some(timestamp);
                    inner.set_status(&mut core, SyncStatus::Idle);
                    inner.events.emit(SyncEvent::SyncComplete { timestamp });
                    return;
                }
            }
        };

        debug!(job = %job.id, kind = %job.kind, retry = job.retry_count, "executing job");
        let result = inner.execute(&job).await;

        let mut core = inner.core.lock();
        core.executing = None;
        match result {
            Ok(()) => debug!(job = %job.id, kind = %job.kind, "job finished"),
            Err(error) => {
                warn!(job = %job.id, kind = %job.kind, error = %error, "job failed");
                let message = error.to_string();
                core.last_error = Some(message.clone());
                inner.set_status(&mut core, SyncStatus::Error);
                inner.events.emit(SyncEvent::SyncError {
                    job,
                    error: message,
                });
            }
        }
    }
}
