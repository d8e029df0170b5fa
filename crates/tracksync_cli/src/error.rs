//! CLI error type.

use thiserror::Error;
use tracksync_engine::SyncError;
use tracksync_vcs::VcsError;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// Queue setup failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A direct git query failed.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Reading stdin or writing stdout failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering JSON failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A network command ran without a token.
    #[error("no token given; pass --token or set TRACKSYNC_TOKEN")]
    MissingToken,

    /// Jobs failed while draining.
    #[error("{failed} job(s) failed during sync")]
    JobsFailed {
        /// Number of failed jobs.
        failed: usize,
    },

    /// The queue reported a conflict that needs `tracksync resolve`.
    #[error("sync conflict: {ahead} local and {behind} remote commits; run `tracksync resolve`")]
    Conflict {
        /// Commits only present locally.
        ahead: u32,
        /// Commits only present on the remote.
        behind: u32,
    },
}
