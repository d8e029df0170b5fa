//! Units of work admitted to the sync queue.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracksync_vcs::Side;
use uuid::Uuid;

/// Opaque identifier of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Stage and commit local changes.
    Commit,
    /// Publish local commits to the remote.
    Push,
    /// Integrate remote commits.
    Pull,
    /// Resolve a conflicted merge.
    Resolve,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::Commit => "commit",
            JobKind::Push => "push",
            JobKind::Pull => "pull",
            JobKind::Resolve => "resolve",
        };
        f.write_str(name)
    }
}

/// How a conflict is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Take the remote version of every conflicted path.
    AcceptTheirs,
    /// Keep the local version of every conflicted path.
    AcceptOurs,
    /// Abandon the merge.
    Abort,
}

impl Resolution {
    /// Returns the winning side, or `None` for [`Resolution::Abort`].
    pub fn side(self) -> Option<Side> {
        match self {
            Resolution::AcceptTheirs => Some(Side::Theirs),
            Resolution::AcceptOurs => Some(Side::Ours),
            Resolution::Abort => None,
        }
    }
}

/// A pending unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// Job id.
    pub id: JobId,
    /// Kind of work.
    pub kind: JobKind,
    /// Commit message (commit jobs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Resolution strategy (resolve jobs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// Number of times the job has been re-queued after a failure.
    pub retry_count: u32,
}

impl Job {
    fn new(kind: JobKind) -> Self {
        Self {
            id: JobId::new(),
            kind,
            message: None,
            resolution: None,
            created_at: Utc::now(),
            retry_count: 0,
        }
    }

    /// Creates a commit job.
    pub fn commit(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(JobKind::Commit)
        }
    }

    /// Creates a push job.
    pub fn push() -> Self {
        Self::new(JobKind::Push)
    }

    /// Creates a pull job.
    pub fn pull() -> Self {
        Self::new(JobKind::Pull)
    }

    /// Creates a resolve job.
    pub fn resolve(resolution: Resolution) -> Self {
        Self {
            resolution: Some(resolution),
            ..Self::new(JobKind::Resolve)
        }
    }

    /// Returns the same job with its retry count incremented.
    pub fn retried(mut self) -> Self {
        self.retry_count += 1;
        self
    }
}
