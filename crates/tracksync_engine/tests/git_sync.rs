//! End-to-end tests of the sync queue driving the git adapter.
//!
//! Tests return early when no `git` executable is available.

use std::sync::Arc;
use std::time::Duration;
use tracksync_engine::{
    Credential, EventKind, QueueConfig, Resolution, Subscription, SyncEvent, SyncQueue,
    DEFAULT_RESOLVE_MESSAGE,
};
use tracksync_testkit::{git, git_available, GitFixture};
use tracksync_vcs::GitCli;

fn queue_for(fixture: &GitFixture) -> SyncQueue<GitCli> {
    let config = QueueConfig::new(fixture.local())
        .with_tracked_path("issues")
        .with_debounce(Duration::from_millis(20))
        .without_periodic_push();
    let queue = SyncQueue::new(config, Arc::new(GitCli::new(fixture.local()))).unwrap();
    queue.set_token(Some(Credential::new("test-token")));
    queue
}

/// Collects events up to and including the next `SyncComplete`.
async fn next_drain(events: &Subscription) -> Vec<SyncEvent> {
    let mut received = Vec::new();
    for _ in 0..600 {
        while let Some(event) = events.try_recv() {
            let done = event.kind() == EventKind::SyncComplete;
            received.push(event);
            if done {
                return received;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("no SyncComplete within 30s; got {received:?}");
}

fn errors(events: &[SyncEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            SyncEvent::SyncError { error, .. } => Some(error.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn commit_and_push_reach_origin() {
    if !git_available() {
        return;
    }
    let fixture = GitFixture::new();
    let queue = queue_for(&fixture);
    let events = queue.subscribe(None);

    fixture.write(fixture.local(), "issues/2.json", "{\"title\":\"second\"}\n");
    queue.enqueue_commit("Add issue 2");
    let drained = next_drain(&events).await;
    assert!(errors(&drained).is_empty(), "{drained:?}");
    assert_eq!(fixture.log(fixture.local())[0], "Add issue 2");
    assert!(queue.has_pending_changes());

    queue.enqueue_push();
    let drained = next_drain(&events).await;
    assert!(errors(&drained).is_empty(), "{drained:?}");
    assert!(!queue.has_pending_changes());

    let remote = git(fixture.origin(), &["log", "--format=%s", "main"]);
    assert!(remote.starts_with("Add issue 2"));
    queue.stop();
}

#[tokio::test]
async fn untracked_paths_are_not_committed() {
    if !git_available() {
        return;
    }
    let fixture = GitFixture::new();
    let queue = queue_for(&fixture);
    let events = queue.subscribe(None);

    fixture.write(fixture.local(), "notes.txt", "scratch\n");
    queue.enqueue_commit("Nothing to see");
    let drained = next_drain(&events).await;

    assert!(errors(&drained).is_empty(), "{drained:?}");
    assert_eq!(fixture.log(fixture.local()), vec!["initial".to_string()]);
    queue.stop();
}

#[tokio::test]
async fn push_catches_up_with_remote_first() {
    if !git_available() {
        return;
    }
    let fixture = GitFixture::new();
    fixture.push_from_other("issues/3.json", "{}\n", "Remote issue 3");

    let queue = queue_for(&fixture);
    let events = queue.subscribe(None);

    queue.enqueue_push();
    let drained = next_drain(&events).await;

    assert!(errors(&drained).is_empty(), "{drained:?}");
    assert!(fixture.local().join("issues/3.json").exists());
    queue.stop();
}

#[tokio::test]
async fn diverged_history_is_resolved_with_theirs() {
    if !git_available() {
        return;
    }
    let fixture = GitFixture::new();
    fixture.push_from_other("issues/1.json", "{\"title\":\"remote\"}\n", "Remote edit");
    fixture.commit_file(
        fixture.local(),
        "issues/1.json",
        "{\"title\":\"local\"}\n",
        "Local edit",
    );

    let queue = queue_for(&fixture);
    let events = queue.subscribe(None);

    queue.enqueue_push();
    let drained = next_drain(&events).await;
    let conflict = drained
        .iter()
        .find_map(|event| match event {
            SyncEvent::Conflict(conflict) => Some(conflict.clone()),
            _ => None,
        })
        .expect("expected a conflict event");
    assert_eq!((conflict.ahead, conflict.behind), (1, 1));

    queue.enqueue_resolve(Resolution::AcceptTheirs);
    let drained = next_drain(&events).await;
    assert!(errors(&drained).is_empty(), "{drained:?}");

    assert_eq!(fixture.read_local("issues/1.json"), "{\"title\":\"remote\"}\n");
    let remote = git(fixture.origin(), &["log", "--format=%s", "main"]);
    assert!(remote.starts_with(DEFAULT_RESOLVE_MESSAGE));
    queue.stop();
}

#[tokio::test]
async fn unresolved_pull_conflict_is_never_committed_or_pushed() {
    if !git_available() {
        return;
    }
    let fixture = GitFixture::new();
    fixture.push_from_other("issues/1.json", "{\"title\":\"remote\"}\n", "Remote edit");
    fixture.commit_file(
        fixture.local(),
        "issues/1.json",
        "{\"title\":\"local\"}\n",
        "Local edit",
    );

    let queue = queue_for(&fixture);
    let events = queue.subscribe(None);

    queue.enqueue_pull();
    let drained = next_drain(&events).await;
    assert_eq!(errors(&drained).len(), 1, "{drained:?}");
    assert!(fixture.read_local("issues/1.json").contains("<<<<<<<"));

    fixture.write(fixture.local(), "issues/2.json", "{\"title\":\"second\"}\n");
    queue.enqueue_commit("Add issue 2");
    let drained = next_drain(&events).await;
    assert_eq!(errors(&drained).len(), 1, "{drained:?}");

    queue.enqueue_push();
    let drained = next_drain(&events).await;
    assert_eq!(errors(&drained).len(), 1, "{drained:?}");

    assert_eq!(fixture.log(fixture.local())[0], "Local edit");
    let remote = git(fixture.origin(), &["log", "--format=%s", "main"]);
    assert!(remote.starts_with("Remote edit"));
    assert_eq!(
        git(fixture.origin(), &["show", "main:issues/1.json"]),
        "{\"title\":\"remote\"}\n"
    );

    // The merge is still open, so resolving settles it.
    queue.enqueue_resolve(Resolution::AcceptTheirs);
    let drained = next_drain(&events).await;
    assert!(errors(&drained).is_empty(), "{drained:?}");
    assert_eq!(fixture.read_local("issues/1.json"), "{\"title\":\"remote\"}\n");
    let remote = git(fixture.origin(), &["log", "--format=%s", "main"]);
    assert!(remote.starts_with(DEFAULT_RESOLVE_MESSAGE));
    queue.stop();
}
