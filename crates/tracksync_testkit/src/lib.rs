//! # tracksync Testkit
//!
//! Test utilities for tracksync.
//!
//! This crate provides:
//! - A queue harness over the scripted [`MockVcs`](tracksync_vcs::MockVcs)
//!   that records every emitted event
//! - Real git fixtures: a bare origin with two working clones
//! - Property-based generators for job admissions using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tracksync_testkit::prelude::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn commit_is_debounced() {
//!     let harness = TestQueue::new().with_token();
//!     harness.enqueue_commit("edit");
//!     harness.wait_until(|h| h.completions() == 1).await;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod repos;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::repos::*;
}

pub use fixtures::*;
pub use generators::*;
pub use repos::*;
