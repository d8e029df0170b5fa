//! Pull command.

use crate::context::{wait_for_completion, Context};
use crate::error::CliResult;
use crate::output::OutputFormat;

pub async fn run(ctx: &Context, format: OutputFormat) -> CliResult<()> {
    ctx.require_credential()?;
    let queue = ctx.queue(ctx.config())?;
    let events = queue.subscribe(None);

    queue.enqueue_pull();

    let report = wait_for_completion(&events, format).await?;
    queue.stop();
    report.into_result()
}
