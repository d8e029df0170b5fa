//! Configuration for the sync queue.

use std::path::PathBuf;
use std::time::Duration;

/// Default quiet period before queued commits are executed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Default interval of the periodic push check.
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Message of the merge commit recorded when a conflict is resolved.
pub const DEFAULT_RESOLVE_MESSAGE: &str = "Resolve sync conflict";

/// Configuration for a sync queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Working directory under version control.
    pub working_directory: PathBuf,
    /// Subtree staged by commit jobs, relative to the working directory.
    pub tracked_path: PathBuf,
    /// Quiet period after the last commit enqueue before draining.
    pub debounce: Duration,
    /// Interval of the automatic push check. `None` disables it.
    pub push_interval: Option<Duration>,
    /// Branch to push. `None` pushes the checked-out branch.
    pub branch: Option<String>,
    /// Message used for conflict-resolution merge commits.
    pub resolve_message: String,
    /// Retry configuration for failed pushes.
    pub retry: RetryConfig,
}

impl QueueConfig {
    /// Creates a configuration for the given working directory.
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            tracked_path: PathBuf::from("."),
            debounce: DEFAULT_DEBOUNCE,
            push_interval: Some(DEFAULT_PUSH_INTERVAL),
            branch: None,
            resolve_message: DEFAULT_RESOLVE_MESSAGE.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the subtree staged by commit jobs.
    pub fn with_tracked_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tracked_path = path.into();
        self
    }

    /// Sets the debounce period.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the periodic push interval.
    pub fn with_push_interval(mut self, interval: Duration) -> Self {
        self.push_interval = Some(interval);
        self
    }

    /// Disables the periodic push check.
    pub fn without_periodic_push(mut self) -> Self {
        self.push_interval = None;
        self
    }

    /// Sets the branch to push.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the conflict-resolution commit message.
    pub fn with_resolve_message(mut self, message: impl Into<String>) -> Self {
        self.resolve_message = message.into();
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Configuration for push retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of times a failed push is re-queued before giving up.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration that never retries.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Returns true if a job that has been retried `retry_count` times may be
    /// retried again.
    pub fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Calculates the delay before retry number `retry_count + 1`.
    ///
    /// `base_delay * multiplier^retry_count`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, retry_count: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .powi(i32::try_from(retry_count).unwrap_or(i32::MAX));
        let secs = self.base_delay.as_secs_f64() * factor;

        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
