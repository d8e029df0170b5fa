//! # tracksync Engine
//!
//! Synchronization queue that keeps a working directory of issue files in
//! sync with a remote git origin.
//!
//! This crate provides:
//! - Job admission with deduplication and priority rules
//! - Debounced commits and a periodic push check
//! - A single-flight drain loop executing one job at a time
//! - Divergence detection and a conflict-resolution protocol
//! - Push retry with exponential backoff
//! - Typed event subscriptions for status reporting
//!
//! ## Architecture
//!
//! Callers never wait for network I/O. A mutation enqueues a commit; after a
//! quiet period the queue drains: commit, then (periodically or on demand)
//! catch up with the remote and push. When local and remote history diverge
//! the queue stops pushing, reports a conflict and waits for an explicit
//! resolve job, which is inserted ahead of everything else.
//!
//! ## Status transitions
//!
//! ```text
//! Idle ──drain──▶ Syncing ──failure──▶ Error ──┐
//!                    │                          │
//!                    └──divergence──▶ Conflict ─┴──drained──▶ Idle
//! ```
//!
//! Once the pending list is empty the queue always returns to `Idle` and
//! emits `SyncComplete`, even directly after a conflict or error. Observers
//! that need to know about the conflict read it from the `Conflict` event or
//! from [`QueueState::conflict_info`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod events;
mod execute;
mod job;
mod pending;
mod queue;
mod state;

pub use config::{
    QueueConfig, RetryConfig, DEFAULT_DEBOUNCE, DEFAULT_PUSH_INTERVAL, DEFAULT_RESOLVE_MESSAGE,
};
pub use error::{SyncError, SyncResult};
pub use events::{ConflictEvent, EventBus, EventKind, Subscription, SyncEvent};
pub use job::{Job, JobId, JobKind, Resolution};
pub use pending::PendingJobs;
pub use queue::SyncQueue;
pub use state::{ConflictInfo, QueueState, SyncStatus};

pub use tracksync_vcs::{Credential, VersionControl};
