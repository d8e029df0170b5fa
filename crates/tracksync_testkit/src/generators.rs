//! Property-based test generators using proptest.
//!
//! Provides strategies for generating sequences of queue admissions.

use proptest::prelude::*;
use tracksync_engine::{Resolution, SyncQueue, VersionControl};

/// One call to a `SyncQueue::enqueue_*` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// `enqueue_commit` with a message.
    Commit(String),
    /// `enqueue_push`.
    Push,
    /// `enqueue_pull`.
    Pull,
    /// `enqueue_resolve`.
    Resolve(Resolution),
}

impl Admission {
    /// Performs the admission on `queue`.
    pub fn apply<V: VersionControl + 'static>(&self, queue: &SyncQueue<V>) {
        match self {
            Admission::Commit(message) => queue.enqueue_commit(message.clone()),
            Admission::Push => queue.enqueue_push(),
            Admission::Pull => queue.enqueue_pull(),
            Admission::Resolve(resolution) => queue.enqueue_resolve(*resolution),
        }
    }
}

/// Strategy for generating commit messages.
pub fn commit_message_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("Update issue #[0-9]{1,4}").expect("Invalid regex")
}

/// Strategy for generating resolutions.
pub fn resolution_strategy() -> impl Strategy<Value = Resolution> {
    prop_oneof![
        Just(Resolution::AcceptTheirs),
        Just(Resolution::AcceptOurs),
        Just(Resolution::Abort),
    ]
}

/// Strategy for generating a single admission.
///
/// Commits are weighted up since they dominate real workloads.
pub fn admission_strategy() -> impl Strategy<Value = Admission> {
    prop_oneof![
        4 => commit_message_strategy().prop_map(Admission::Commit),
        2 => Just(Admission::Push),
        2 => Just(Admission::Pull),
        1 => resolution_strategy().prop_map(Admission::Resolve),
    ]
}

/// Strategy for generating admission sequences of up to `max_len` calls.
pub fn admissions_strategy(max_len: usize) -> impl Strategy<Value = Vec<Admission>> {
    prop::collection::vec(admission_strategy(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn commit_messages_are_nonempty(message in commit_message_strategy()) {
            prop_assert!(message.starts_with("Update issue #"));
        }

        #[test]
        fn sequences_respect_max_len(admissions in admissions_strategy(8)) {
            prop_assert!(admissions.len() <= 8);
        }
    }
}
