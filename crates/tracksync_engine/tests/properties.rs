//! Property tests for job admission through the public queue API.

use proptest::prelude::*;
use std::sync::Arc;
use tracksync_engine::{JobKind, SyncQueue};
use tracksync_testkit::{admissions_strategy, test_config, Admission};
use tracksync_vcs::MockVcs;

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn admitted_jobs_respect_ordering_rules(admissions in admissions_strategy(32)) {
        let rt = paused_runtime();
        let pending = rt.block_on(async {
            let queue = SyncQueue::new(test_config(), Arc::new(MockVcs::new())).unwrap();
            // Nothing yields here, so the drain never gets to run.
            for admission in &admissions {
                admission.apply(&queue);
            }
            let pending = queue.pending();
            queue.stop();
            pending
        });

        for kind in [JobKind::Commit, JobKind::Push, JobKind::Pull, JobKind::Resolve] {
            prop_assert!(pending.iter().filter(|job| job.kind == kind).count() <= 1);
        }

        let position = |kind: JobKind| pending.iter().position(|job| job.kind == kind);
        if let Some(resolve) = position(JobKind::Resolve) {
            prop_assert_eq!(resolve, 0);
        }
        if let (Some(pull), Some(commit)) = (position(JobKind::Pull), position(JobKind::Commit)) {
            prop_assert!(pull < commit);
        }
        if let (Some(pull), Some(push)) = (position(JobKind::Pull), position(JobKind::Push)) {
            prop_assert!(pull < push);
        }

        let last_commit = admissions.iter().rev().find_map(|admission| match admission {
            Admission::Commit(message) => Some(message.clone()),
            _ => None,
        });
        let pending_commit = pending
            .iter()
            .find(|job| job.kind == JobKind::Commit)
            .and_then(|job| job.message.clone());
        prop_assert_eq!(pending_commit, last_commit);

        let last_resolution = admissions.iter().rev().find_map(|admission| match admission {
            Admission::Resolve(resolution) => Some(*resolution),
            _ => None,
        });
        let pending_resolution = pending
            .iter()
            .find(|job| job.kind == JobKind::Resolve)
            .and_then(|job| job.resolution);
        prop_assert_eq!(pending_resolution, last_resolution);
    }
}
