//! Error types for the sync queue.

use thiserror::Error;
use tracksync_vcs::VcsError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while executing sync jobs.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// A network job ran without a credential.
    #[error("no credential available")]
    MissingCredential,

    /// Local and remote history have diverged or a merge left conflicts.
    #[error("sync conflict: {ahead} local and {behind} remote commits need manual resolution")]
    Conflict {
        /// Commits only present locally.
        ahead: u32,
        /// Commits only present on the remote.
        behind: u32,
    },

    /// A push kept failing after every allowed retry.
    #[error("push retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of push attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },

    /// Version-control failure.
    #[error("version control error: {0}")]
    Vcs(#[from] VcsError),

    /// The queue was created outside a tokio runtime.
    #[error("sync queue requires a tokio runtime")]
    NoRuntime,
}

impl SyncError {
    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Vcs(err) => !err.is_non_fast_forward(),
            _ => false,
        }
    }

    /// Returns true if this error reports divergence that needs resolution.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Conflict { .. })
    }
}
