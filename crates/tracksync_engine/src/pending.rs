//! Pending job list with deduplication and priority rules.
//!
//! After every mutation the list holds at most one job of each kind, and a
//! pending resolve job is always at the front.

use crate::job::{Job, JobKind};
use std::collections::VecDeque;

/// Ordered list of jobs waiting to be executed.
#[derive(Debug, Default, Clone)]
pub struct PendingJobs {
    jobs: VecDeque<Job>,
}

impl PendingJobs {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pending jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if no job is pending.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns true if a job of `kind` is pending.
    pub fn contains(&self, kind: JobKind) -> bool {
        self.jobs.iter().any(|job| job.kind == kind)
    }

    /// Returns the pending jobs in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Removes and returns the next job to execute.
    pub fn pop_front(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    /// Admits a commit job, replacing any pending commit.
    ///
    /// Returns the replaced job.
    pub fn admit_commit(&mut self, job: Job) -> Option<Job> {
        debug_assert_eq!(job.kind, JobKind::Commit);
        let replaced = self.remove(JobKind::Commit);
        self.jobs.push_back(job);
        replaced
    }

    /// Admits a push job at the back unless one is already pending.
    ///
    /// Returns true if the job was added.
    pub fn admit_push(&mut self, job: Job) -> bool {
        debug_assert_eq!(job.kind, JobKind::Push);
        if self.contains(JobKind::Push) {
            return false;
        }
        self.jobs.push_back(job);
        true
    }

    /// Admits a pull job ahead of commits and pushes unless one is already
    /// pending.
    ///
    /// Returns true if the job was added.
    pub fn admit_pull(&mut self, job: Job) -> bool {
        debug_assert_eq!(job.kind, JobKind::Pull);
        if self.contains(JobKind::Pull) {
            return false;
        }
        self.insert_after_resolve(job);
        true
    }

    /// Admits a resolve job at the very front, replacing any pending resolve.
    ///
    /// Returns the replaced job.
    pub fn admit_resolve(&mut self, job: Job) -> Option<Job> {
        debug_assert_eq!(job.kind, JobKind::Resolve);
        let replaced = self.remove(JobKind::Resolve);
        self.jobs.push_front(job);
        replaced
    }

    /// Puts a job that is being retried back ahead of commits and pushes.
    pub fn requeue(&mut self, job: Job) {
        self.insert_after_resolve(job);
    }

    fn insert_after_resolve(&mut self, job: Job) {
        let index = self
            .jobs
            .iter()
            .take_while(|pending| pending.kind == JobKind::Resolve)
            .count();
        self.jobs.insert(index, job);
    }

    fn remove(&mut self, kind: JobKind) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.kind == kind)?;
        self.jobs.remove(index)
    }
}
