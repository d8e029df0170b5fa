//! Settings shared by all commands.

use crate::error::{CliError, CliResult};
use crate::output::{print_event, OutputFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracksync_engine::{
    Credential, EventKind, QueueConfig, Subscription, SyncEvent, SyncQueue,
};
use tracksync_vcs::GitCli;

/// How often a waiting command polls its subscription.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct Context {
    path: PathBuf,
    tracked: PathBuf,
    token: Option<String>,
    branch: Option<String>,
}

impl Context {
    pub fn new(
        path: PathBuf,
        tracked: PathBuf,
        token: Option<String>,
        branch: Option<String>,
    ) -> Self {
        Self {
            path,
            tracked,
            token: token.filter(|t| !t.is_empty()),
            branch,
        }
    }

    pub fn credential(&self) -> Option<Credential> {
        self.token.clone().map(Credential::new)
    }

    pub fn require_credential(&self) -> CliResult<Credential> {
        self.credential().ok_or(CliError::MissingToken)
    }

    pub fn git(&self) -> GitCli {
        GitCli::new(&self.path)
    }

    /// Queue configuration for one-shot commands: no periodic push.
    pub fn config(&self) -> QueueConfig {
        let config = QueueConfig::new(&self.path)
            .with_tracked_path(&self.tracked)
            .without_periodic_push();
        match &self.branch {
            Some(branch) => config.with_branch(branch),
            None => config,
        }
    }

    pub fn queue(&self, config: QueueConfig) -> CliResult<SyncQueue<GitCli>> {
        let queue = SyncQueue::new(config, Arc::new(self.git()))?;
        queue.set_token(self.credential());
        Ok(queue)
    }
}

/// Outcome of waiting for one drain.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub failed: usize,
    pub conflict: Option<(u32, u32)>,
}

impl DrainReport {
    fn record(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::SyncError { .. } => self.failed += 1,
            SyncEvent::Conflict(conflict) => {
                self.conflict = Some((conflict.ahead, conflict.behind));
            }
            _ => {}
        }
    }

    /// Turns the report into the command's exit status.
    pub fn into_result(self) -> CliResult<()> {
        if let Some((ahead, behind)) = self.conflict {
            return Err(CliError::Conflict { ahead, behind });
        }
        if self.failed > 0 {
            return Err(CliError::JobsFailed {
                failed: self.failed,
            });
        }
        Ok(())
    }
}

/// Prints events until the queue reports completion.
pub async fn wait_for_completion(
    events: &Subscription,
    format: OutputFormat,
) -> CliResult<DrainReport> {
    let mut report = DrainReport::default();
    loop {
        while let Some(event) = events.try_recv() {
            print_event(&event, format)?;
            report.record(&event);
            if event.kind() == EventKind::SyncComplete {
                return Ok(report);
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
