//! Sync command - commit the tracked subtree and push it.

use crate::context::{wait_for_completion, Context};
use crate::error::CliResult;
use crate::output::OutputFormat;
use tracing::info;

pub async fn run(ctx: &Context, message: &str, format: OutputFormat) -> CliResult<()> {
    ctx.require_credential()?;
    let queue = ctx.queue(ctx.config())?;
    let events = queue.subscribe(None);

    queue.enqueue_commit(message);
    // The push starts the drain right away; the commit ahead of it runs first.
    queue.enqueue_push();

    let report = wait_for_completion(&events, format).await?;
    queue.stop();
    info!(pending_changes = queue.has_pending_changes(), "sync finished");
    report.into_result()
}
