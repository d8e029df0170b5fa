//! Watch command - long-running host for a sync queue.
//!
//! Every non-empty stdin line enqueues a commit with that line as message.
//! Events stream to stdout from a dedicated thread. On Ctrl-C or end of
//! input the timers stop, outstanding work is flushed with a final push,
//! and the printer is joined once the queue is gone.

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{EventPrinter, OutputFormat};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracksync_engine::EventKind;

pub async fn run(
    ctx: &Context,
    debounce_ms: u64,
    push_interval: u64,
    format: OutputFormat,
) -> CliResult<()> {
    let mut config = ctx
        .config()
        .with_debounce(Duration::from_millis(debounce_ms));
    if push_interval > 0 {
        config = config.with_push_interval(Duration::from_secs(push_interval));
    }
    if ctx.credential().is_none() {
        warn!("no token set; changes are committed locally but not pushed");
    }

    let queue = ctx.queue(config)?;
    let printer = EventPrinter::spawn(queue.subscribe(None), format, std::io::stdout());

    info!(
        path = %queue.config().working_directory.display(),
        "watching stdin for changes; Ctrl-C to stop"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let message = line.trim();
                    if !message.is_empty() {
                        queue.enqueue_commit(message);
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    queue.stop();

    let outstanding = !queue.pending().is_empty()
        || (queue.has_pending_changes() && queue.has_token());
    if outstanding {
        info!("flushing outstanding changes");
        let completions = queue.subscribe(Some(EventKind::SyncComplete));
        queue.enqueue_push();
        while completions.try_recv().is_none() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    drop(queue);
    printer.finish().await;
    Ok(())
}
