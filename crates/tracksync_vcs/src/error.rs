//! Error types for version-control operations.

use std::process::ExitStatus;
use thiserror::Error;

/// Result type for version-control operations.
pub type VcsResult<T> = Result<T, VcsError>;

/// Errors reported by a version-control port.
///
/// Ordinary failures (a rejected push, a merge that stopped on conflicts, a
/// command exiting non-zero) are returned as values of this type. Nothing in
/// a port implementation panics for them.
#[derive(Error, Debug, Clone)]
pub enum VcsError {
    /// The version-control binary could not be started.
    #[error("failed to run {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error message.
        message: String,
    },

    /// A command ran but exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        /// Command line, without credentials.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The remote refused a push.
    #[error("push rejected: {message}")]
    Rejected {
        /// Whether the rejection was a non-fast-forward update.
        non_fast_forward: bool,
        /// Remote or client message.
        message: String,
    },

    /// Command output could not be interpreted.
    #[error("unexpected output: {0}")]
    Parse(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl VcsError {
    /// Creates a failure for a command that exited unsuccessfully.
    pub fn command_failed(
        command: impl Into<String>,
        status: ExitStatus,
        stderr: impl Into<String>,
    ) -> Self {
        let status = match status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        Self::CommandFailed {
            command: command.into(),
            status,
            stderr: stderr.into().trim().to_string(),
        }
    }

    /// Creates a non-fast-forward push rejection.
    pub fn non_fast_forward(message: impl Into<String>) -> Self {
        Self::Rejected {
            non_fast_forward: true,
            message: message.into(),
        }
    }

    /// Creates a push rejection for any other reason.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            non_fast_forward: false,
            message: message.into(),
        }
    }

    /// Returns true if this is a non-fast-forward push rejection.
    pub fn is_non_fast_forward(&self) -> bool {
        matches!(
            self,
            VcsError::Rejected {
                non_fast_forward: true,
                ..
            }
        )
    }

    /// Returns the captured command output, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            VcsError::CommandFailed { stderr, .. } => Some(stderr),
            VcsError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Returns true if push output describes a non-fast-forward rejection.
pub fn looks_like_non_fast_forward(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    lower.contains("non-fast-forward")
        || lower.contains("fetch first")
        || (lower.contains("[rejected]") && !lower.contains("hook declined"))
}
