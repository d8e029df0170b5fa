//! Command implementations.

pub mod pull;
pub mod resolve;
pub mod status;
pub mod sync;
pub mod watch;
