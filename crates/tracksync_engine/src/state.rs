//! Observable queue state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// The current status of a sync queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Nothing is being processed.
    #[default]
    Idle,
    /// The drain loop is executing jobs.
    Syncing,
    /// The last job failed.
    Error,
    /// Local and remote history need manual resolution.
    Conflict,
}

impl SyncStatus {
    /// Returns true while jobs are being executed.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Error => "error",
            SyncStatus::Conflict => "conflict",
        };
        f.write_str(name)
    }
}

/// Divergence recorded when a conflict was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictInfo {
    /// Commits only present locally.
    pub ahead: u32,
    /// Commits only present on the remote.
    pub behind: u32,
}

/// Snapshot of a queue's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueState {
    /// Current status.
    pub status: SyncStatus,
    /// Number of jobs waiting to run.
    pub pending_jobs: usize,
    /// When the drain loop last emptied the pending list.
    pub last_sync: Option<DateTime<Utc>>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// Divergence of the most recent conflict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_info: Option<ConflictInfo>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            pending_jobs: 0,
            last_sync: None,
            last_error: None,
            conflict_info: None,
        }
    }
}
