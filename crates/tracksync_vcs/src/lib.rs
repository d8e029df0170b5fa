//! # tracksync VCS
//!
//! Version-control port for the tracksync synchronization queue.
//!
//! This crate provides:
//! - The [`VersionControl`] port the queue drives (fetch, pull, push,
//!   branch comparison, conflict detection and resolution, stage/commit)
//! - [`GitCli`], an implementation backed by the `git` executable
//! - [`MockVcs`], a scripted implementation for tests
//!
//! ## Failures are values
//!
//! Port methods never panic for ordinary failures. A rejected push, a merge
//! that stopped on conflicts or a command exiting non-zero is returned as a
//! [`VcsError`], and non-fast-forward rejections are classified so callers can
//! tell divergence apart from transient network trouble.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod git;
mod mock;
mod port;

pub use error::{looks_like_non_fast_forward, VcsError, VcsResult};
pub use git::GitCli;
pub use mock::{MockVcs, VcsCall};
pub use port::{BranchComparison, Credential, PullStrategy, Side, VersionControl};
