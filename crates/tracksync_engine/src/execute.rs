//! Job execution: commit, pull, push and conflict resolution.

use crate::error::{SyncError, SyncResult};
use crate::job::{Job, JobKind, Resolution};
use crate::queue::Inner;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracksync_vcs::{BranchComparison, PullStrategy, VcsError, VersionControl};

/// Commit message used when a commit job carries none.
const FALLBACK_COMMIT_MESSAGE: &str = "Update tracked files";

impl<V: VersionControl + 'static> Inner<V> {
    /// Executes one job.
    pub(crate) async fn execute(self: &Arc<Self>, job: &Job) -> SyncResult<()> {
        match job.kind {
            JobKind::Commit => self.commit(job).await,
            JobKind::Pull => self.pull().await,
            JobKind::Push => self.push(job).await,
            JobKind::Resolve => {
                self.resolve(job.resolution.unwrap_or(Resolution::Abort))
                    .await
            }
        }
    }

    /// Stages the tracked subtree and commits it if anything changed.
    ///
    /// Refuses to run while a merge has unmerged paths, since staging them
    /// would commit the conflict markers and conclude the merge.
    async fn commit(&self, job: &Job) -> SyncResult<()> {
        if self.vcs.has_conflicts().await {
            return Err(self
                .unmerged_conflict("Unresolved merge conflicts; resolve before committing")
                .await);
        }

        self.vcs.stage_all(&self.config.tracked_path).await?;
        if !self.vcs.has_staged_changes().await? {
            debug!(job = %job.id, "nothing to commit");
            return Ok(());
        }

        let message = job.message.as_deref().unwrap_or(FALLBACK_COMMIT_MESSAGE);
        self.vcs.commit(message).await?;
        info!(job = %job.id, "committed local changes");
        Ok(())
    }

    /// Merges the upstream branch, surfacing conflicts it leaves behind.
    async fn pull(&self) -> SyncResult<()> {
        let credential = self.credential()?;
        let pulled = self.vcs.pull(&credential, PullStrategy::Merge).await;

        if self.vcs.has_conflicts().await {
            return Err(self
                .unmerged_conflict("Merge conflicts detected after pull")
                .await);
        }

        pulled?;
        info!("pulled remote changes");
        Ok(())
    }

    /// Publishes local commits.
    ///
    /// Catches up with a rebase when only behind, refuses to push into
    /// diverged history, and re-queues itself with backoff on transient
    /// failures.
    async fn push(&self, job: &Job) -> SyncResult<()> {
        let credential = self.credential()?;

        if self.vcs.has_conflicts().await {
            return Err(self
                .unmerged_conflict("Unresolved merge conflicts; resolve before pushing")
                .await);
        }

        self.vcs.fetch(&credential).await?;
        let comparison = self.vcs.compare_branches().await?;

        if comparison.diverged {
            return Err(self.record_conflict(
                comparison,
                "Local and remote history have diverged",
                false,
            ));
        }

        if comparison.behind > 0 {
            info!(behind = comparison.behind, "behind remote, rebasing before push");
            let pulled = self.vcs.pull(&credential, PullStrategy::Rebase).await;
            if self.vcs.has_conflicts().await {
                return Err(self.record_conflict(
                    comparison,
                    "Rebase onto remote changes stopped on conflicts",
                    true,
                ));
            }
            pulled?;
        }

        match self
            .vcs
            .push(&credential, self.config.branch.as_deref())
            .await
        {
            Ok(()) => {
                self.core.lock().pending_changes = false;
                info!(ahead = comparison.ahead, "pushed local commits");
                Ok(())
            }
            Err(error) => {
                if error.is_non_fast_forward() {
                    self.vcs.fetch(&credential).await?;
                    let comparison = self.vcs.compare_branches().await?;
                    if comparison.behind > 0 {
                        return Err(self.record_conflict(
                            comparison,
                            "Push rejected: remote has commits not present locally",
                            false,
                        ));
                    }
                }
                self.retry_push(job, error).await
            }
        }
    }

    /// Sleeps for the backoff delay and puts the push back at the front, or
    /// gives up once the retry budget is spent.
    async fn retry_push(&self, job: &Job, error: VcsError) -> SyncResult<()> {
        let retry = &self.config.retry;
        if !retry.should_retry(job.retry_count) {
            return Err(SyncError::RetriesExhausted {
                attempts: job.retry_count + 1,
                last_error: error.to_string(),
            });
        }

        let delay = retry.delay_for_attempt(job.retry_count);
        warn!(
            job = %job.id,
            attempt = job.retry_count + 1,
            max_retries = retry.max_retries,
            ?delay,
            error = %error,
            "push failed, retrying"
        );
        tokio::time::sleep(delay).await;

        self.core.lock().pending.requeue(job.clone().retried());
        Ok(())
    }

    /// Aborts the merge or settles every conflicted path on one side,
    /// commits, and queues a push of the result.
    async fn resolve(self: &Arc<Self>, resolution: Resolution) -> SyncResult<()> {
        let Some(side) = resolution.side() else {
            self.vcs.abort_merge().await?;
            info!("merge aborted");
            return Ok(());
        };

        if !self.vcs.has_conflicts().await {
            // Diverged without a merge in progress: merge first so the
            // conflicting paths materialize.
            let credential = self.credential()?;
            let merged = self.vcs.pull(&credential, PullStrategy::Merge).await;
            if !self.vcs.has_conflicts().await {
                merged?;
                info!(?resolution, "remote history merged cleanly");
                self.enqueue_push();
                return Ok(());
            }
        }

        let paths = self.vcs.conflicted_paths().await?;
        for path in &paths {
            self.vcs.checkout_side(path, side).await?;
        }
        self.vcs.stage_paths(&paths).await?;
        self.vcs.commit(&self.config.resolve_message).await?;
        info!(?resolution, paths = paths.len(), "conflict resolved");

        self.enqueue_push();
        Ok(())
    }

    /// Records a conflict for a working tree with unmerged paths.
    ///
    /// A failed branch comparison is reported in the message rather than
    /// as zero counts.
    async fn unmerged_conflict(&self, message: &str) -> SyncError {
        match self.vcs.compare_branches().await {
            Ok(comparison) => self.record_conflict(comparison, message, true),
            Err(error) => {
                warn!(error = %error, "could not compare branches");
                self.record_conflict(
                    BranchComparison::default(),
                    &format!("{message} (branch comparison failed: {error})"),
                    true,
                )
            }
        }
    }
}
