//! Version-control port consumed by the sync queue.

use crate::error::VcsResult;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// An opaque access credential for the remote (for example an OAuth token).
///
/// The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// How a pull integrates remote history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategy {
    /// Merge the upstream branch into the local branch.
    Merge,
    /// Replay local commits on top of the upstream branch.
    Rebase,
}

/// Which side of a conflicted merge wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Keep the local version.
    Ours,
    /// Take the remote version.
    Theirs,
}

/// Position of the local branch relative to its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BranchComparison {
    /// Commits present locally but not on the remote.
    pub ahead: u32,
    /// Commits present on the remote but not locally.
    pub behind: u32,
    /// Both ahead and behind are non-zero.
    pub diverged: bool,
}

impl BranchComparison {
    /// Builds a comparison from ahead/behind counts.
    pub fn new(ahead: u32, behind: u32) -> Self {
        Self {
            ahead,
            behind,
            diverged: ahead > 0 && behind > 0,
        }
    }

    /// Returns true if local and remote point at the same history.
    pub fn is_up_to_date(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

/// Operations the sync queue needs from a version-control system.
///
/// Implementations act on a single working directory. Network operations take
/// the credential explicitly; local operations never need one.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Fetches remote state without touching the working tree.
    async fn fetch(&self, credential: &Credential) -> VcsResult<()>;

    /// Pulls the upstream branch into the current branch.
    async fn pull(&self, credential: &Credential, strategy: PullStrategy) -> VcsResult<()>;

    /// Pushes the current branch, or `branch` if given.
    async fn push(&self, credential: &Credential, branch: Option<&str>) -> VcsResult<()>;

    /// Compares the current branch against its upstream.
    async fn compare_branches(&self) -> VcsResult<BranchComparison>;

    /// Returns the name of the checked-out branch.
    async fn current_branch(&self) -> VcsResult<String>;

    /// Returns true if the working tree has unresolved merge conflicts.
    async fn has_conflicts(&self) -> bool;

    /// Lists paths with unresolved merge conflicts.
    async fn conflicted_paths(&self) -> VcsResult<Vec<PathBuf>>;

    /// Aborts an in-progress merge or rebase.
    async fn abort_merge(&self) -> VcsResult<()>;

    /// Checks out one side of a conflicted path.
    async fn checkout_side(&self, path: &Path, side: Side) -> VcsResult<()>;

    /// Stages every change under `subtree`.
    async fn stage_all(&self, subtree: &Path) -> VcsResult<()>;

    /// Stages the given paths.
    async fn stage_paths(&self, paths: &[PathBuf]) -> VcsResult<()>;

    /// Returns true if the index differs from `HEAD`.
    async fn has_staged_changes(&self) -> VcsResult<bool>;

    /// Records the index as a new commit.
    async fn commit(&self, message: &str) -> VcsResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_divergence() {
        assert!(BranchComparison::new(2, 3).diverged);
        assert!(!BranchComparison::new(2, 0).diverged);
        assert!(!BranchComparison::new(0, 4).diverged);
        assert!(BranchComparison::new(0, 0).is_up_to_date());
    }

    #[test]
    fn credential_is_redacted() {
        let credential = Credential::new("gho_secret");
        assert_eq!(credential.secret(), "gho_secret");
        assert!(!format!("{credential:?}").contains("gho_secret"));
    }
}
