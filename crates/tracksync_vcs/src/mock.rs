//! Scripted in-memory port for testing.

use crate::error::{VcsError, VcsResult};
use crate::port::{BranchComparison, Credential, PullStrategy, Side, VersionControl};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// A call received by [`MockVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    /// `fetch`.
    Fetch,
    /// `pull` with the given strategy.
    Pull(PullStrategy),
    /// `push` with the given branch override.
    Push(Option<String>),
    /// `compare_branches`.
    CompareBranches,
    /// `current_branch`.
    CurrentBranch,
    /// `has_conflicts`.
    HasConflicts,
    /// `conflicted_paths`.
    ConflictedPaths,
    /// `abort_merge`.
    AbortMerge,
    /// `checkout_side`.
    CheckoutSide(PathBuf, Side),
    /// `stage_all`.
    StageAll(PathBuf),
    /// `stage_paths`.
    StagePaths(Vec<PathBuf>),
    /// `has_staged_changes`.
    HasStagedChanges,
    /// `commit` with the given message.
    Commit(String),
}

#[derive(Debug)]
struct MockState {
    calls: Vec<VcsCall>,
    branch: String,
    comparison: BranchComparison,
    scripted_comparisons: VecDeque<BranchComparison>,
    push_results: VecDeque<VcsResult<()>>,
    pull_results: VecDeque<VcsResult<()>>,
    fetch_error: Option<VcsError>,
    compare_error: Option<VcsError>,
    commit_error: Option<VcsError>,
    conflicts: Vec<PathBuf>,
    conflicts_on_pull: Vec<PathBuf>,
    staged: bool,
    commits: Vec<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            branch: "main".to_string(),
            comparison: BranchComparison::default(),
            scripted_comparisons: VecDeque::new(),
            push_results: VecDeque::new(),
            pull_results: VecDeque::new(),
            fetch_error: None,
            compare_error: None,
            commit_error: None,
            conflicts: Vec::new(),
            conflicts_on_pull: Vec::new(),
            staged: false,
            commits: Vec::new(),
        }
    }
}

/// A mock version-control port.
///
/// Every call is recorded. Results default to success with an up-to-date
/// branch, no conflicts, and nothing staged; tests script the rest.
#[derive(Debug, Default)]
pub struct MockVcs {
    state: Mutex<MockState>,
}

impl MockVcs {
    /// Creates a new mock port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comparison returned once scripted comparisons run out.
    pub fn set_comparison(&self, comparison: BranchComparison) {
        self.state.lock().comparison = comparison;
    }

    /// Queues a comparison returned by the next `compare_branches` call.
    pub fn script_comparison(&self, comparison: BranchComparison) {
        self.state.lock().scripted_comparisons.push_back(comparison);
    }

    /// Queues the result of the next `push` call. Pushes succeed once the
    /// queue is empty.
    pub fn script_push(&self, result: VcsResult<()>) {
        self.state.lock().push_results.push_back(result);
    }

    /// Queues the result of the next `pull` call.
    pub fn script_pull(&self, result: VcsResult<()>) {
        self.state.lock().pull_results.push_back(result);
    }

    /// Makes every `fetch` fail with `error`.
    pub fn fail_fetch(&self, error: VcsError) {
        self.state.lock().fetch_error = Some(error);
    }

    /// Makes every `compare_branches` fail with `error`.
    pub fn fail_compare(&self, error: VcsError) {
        self.state.lock().compare_error = Some(error);
    }

    /// Makes every `commit` fail with `error`.
    pub fn fail_commit(&self, error: VcsError) {
        self.state.lock().commit_error = Some(error);
    }

    /// Sets the currently conflicted paths.
    pub fn set_conflicts(&self, paths: Vec<PathBuf>) {
        self.state.lock().conflicts = paths;
    }

    /// Makes the next `pull` leave the given paths conflicted.
    pub fn conflict_on_pull(&self, paths: Vec<PathBuf>) {
        self.state.lock().conflicts_on_pull = paths;
    }

    /// Sets whether `stage_all` produces a non-empty staged diff.
    pub fn set_staged_changes(&self, staged: bool) {
        self.state.lock().staged = staged;
    }

    /// Sets the branch reported by `current_branch`.
    pub fn set_branch(&self, branch: impl Into<String>) {
        self.state.lock().branch = branch.into();
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<VcsCall> {
        self.state.lock().calls.clone()
    }

    /// Returns the number of `push` calls received.
    pub fn push_count(&self) -> usize {
        self.count(|call| matches!(call, VcsCall::Push(_)))
    }

    /// Returns the number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&VcsCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Returns the messages of commits created so far.
    pub fn commits(&self) -> Vec<String> {
        self.state.lock().commits.clone()
    }

    fn record(&self, call: VcsCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn fetch(&self, _credential: &Credential) -> VcsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::Fetch);
        match &state.fetch_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn pull(&self, _credential: &Credential, strategy: PullStrategy) -> VcsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::Pull(strategy));
        if !state.conflicts_on_pull.is_empty() {
            let paths = std::mem::take(&mut state.conflicts_on_pull);
            state.conflicts = paths;
            return Err(VcsError::Other("automatic merge failed".into()));
        }
        state.pull_results.pop_front().unwrap_or(Ok(()))
    }

    async fn push(&self, _credential: &Credential, branch: Option<&str>) -> VcsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::Push(branch.map(str::to_string)));
        state.push_results.pop_front().unwrap_or(Ok(()))
    }

    async fn compare_branches(&self) -> VcsResult<BranchComparison> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::CompareBranches);
        if let Some(error) = &state.compare_error {
            return Err(error.clone());
        }
        let comparison = state
            .scripted_comparisons
            .pop_front()
            .unwrap_or(state.comparison);
        Ok(comparison)
    }

    async fn current_branch(&self) -> VcsResult<String> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::CurrentBranch);
        Ok(state.branch.clone())
    }

    async fn has_conflicts(&self) -> bool {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::HasConflicts);
        !state.conflicts.is_empty()
    }

    async fn conflicted_paths(&self) -> VcsResult<Vec<PathBuf>> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::ConflictedPaths);
        Ok(state.conflicts.clone())
    }

    async fn abort_merge(&self) -> VcsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::AbortMerge);
        state.conflicts.clear();
        Ok(())
    }

    async fn checkout_side(&self, path: &Path, side: Side) -> VcsResult<()> {
        self.record(VcsCall::CheckoutSide(path.to_path_buf(), side));
        Ok(())
    }

    async fn stage_all(&self, subtree: &Path) -> VcsResult<()> {
        self.record(VcsCall::StageAll(subtree.to_path_buf()));
        Ok(())
    }

    async fn stage_paths(&self, paths: &[PathBuf]) -> VcsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::StagePaths(paths.to_vec()));
        state.conflicts.retain(|p| !paths.contains(p));
        state.staged = true;
        Ok(())
    }

    async fn has_staged_changes(&self) -> VcsResult<bool> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::HasStagedChanges);
        Ok(state.staged)
    }

    async fn commit(&self, message: &str) -> VcsResult<()> {
        let mut state = self.state.lock();
        state.calls.push(VcsCall::Commit(message.to_string()));
        if let Some(error) = &state.commit_error {
            return Err(error.clone());
        }
        state.commits.push(message.to_string());
        state.staged = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls() {
        let vcs = MockVcs::new();
        let credential = Credential::new("t");

        vcs.fetch(&credential).await.unwrap();
        vcs.push(&credential, Some("main")).await.unwrap();

        assert_eq!(
            vcs.calls(),
            vec![VcsCall::Fetch, VcsCall::Push(Some("main".into()))]
        );
        assert_eq!(vcs.push_count(), 1);
    }

    #[tokio::test]
    async fn scripted_results_are_consumed_in_order() {
        let vcs = MockVcs::new();
        let credential = Credential::new("t");
        vcs.script_push(Err(VcsError::non_fast_forward("stale")));
        vcs.script_comparison(BranchComparison::new(1, 1));
        vcs.set_comparison(BranchComparison::new(1, 0));

        assert!(vcs.push(&credential, None).await.unwrap_err().is_non_fast_forward());
        assert!(vcs.push(&credential, None).await.is_ok());

        assert!(vcs.compare_branches().await.unwrap().diverged);
        assert!(!vcs.compare_branches().await.unwrap().diverged);
    }

    #[tokio::test]
    async fn pull_can_leave_conflicts() {
        let vcs = MockVcs::new();
        vcs.conflict_on_pull(vec![PathBuf::from("issues/1.json")]);

        assert!(!vcs.has_conflicts().await);
        assert!(vcs
            .pull(&Credential::new("t"), PullStrategy::Merge)
            .await
            .is_err());
        assert!(vcs.has_conflicts().await);

        vcs.abort_merge().await.unwrap();
        assert!(!vcs.has_conflicts().await);
    }

    #[tokio::test]
    async fn commit_clears_staged_diff() {
        let vcs = MockVcs::new();
        vcs.set_staged_changes(true);

        assert!(vcs.has_staged_changes().await.unwrap());
        vcs.commit("update").await.unwrap();
        assert!(!vcs.has_staged_changes().await.unwrap());
        assert_eq!(vcs.commits(), vec!["update".to_string()]);
    }
}
