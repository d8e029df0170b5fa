//! Resolve command.

use crate::context::{wait_for_completion, Context};
use crate::error::CliResult;
use crate::output::OutputFormat;
use tracksync_engine::Resolution;

pub async fn run(
    ctx: &Context,
    resolution: Resolution,
    message: Option<String>,
    format: OutputFormat,
) -> CliResult<()> {
    if resolution != Resolution::Abort {
        ctx.require_credential()?;
    }
    let config = match message {
        Some(message) => ctx.config().with_resolve_message(message),
        None => ctx.config(),
    };
    let queue = ctx.queue(config)?;
    let events = queue.subscribe(None);

    queue.enqueue_resolve(resolution);

    let report = wait_for_completion(&events, format).await?;
    queue.stop();
    report.into_result()
}
