//! Event rendering.

use crate::error::CliResult;
use clap::ValueEnum;
use std::io::Write;
use std::thread::JoinHandle;
use tracing::warn;
use tracksync_engine::{Subscription, SyncEvent};

/// Output format for command results and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Renders an event as a single line.
pub fn render_event(event: &SyncEvent, format: OutputFormat) -> CliResult<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string(event)?);
    }

    let line = match event {
        SyncEvent::StatusChange { status, state } => {
            format!("status: {} ({} pending)", status, state.pending_jobs)
        }
        SyncEvent::SyncComplete { timestamp } => {
            format!("sync complete at {}", timestamp.to_rfc3339())
        }
        SyncEvent::SyncError { job, error } => format!("error [{}]: {}", job.kind, error),
        SyncEvent::Conflict(conflict) => {
            let mut line = format!(
                "conflict: {} (ahead {}, behind {})",
                conflict.message, conflict.ahead, conflict.behind
            );
            if conflict.has_conflicts {
                line.push_str(", working tree has unmerged files");
            }
            line
        }
    };
    Ok(line)
}

pub fn print_event(event: &SyncEvent, format: OutputFormat) -> CliResult<()> {
    write_event(&mut std::io::stdout().lock(), event, format)
}

/// Writes an event as one line and flushes it.
pub fn write_event<W: Write>(
    out: &mut W,
    event: &SyncEvent,
    format: OutputFormat,
) -> CliResult<()> {
    writeln!(out, "{}", render_event(event, format)?)?;
    out.flush()?;
    Ok(())
}

/// Streams events from a subscription to a writer on its own thread.
///
/// The thread runs until every sender of the subscription is gone, that
/// is, until the queue has been dropped and its drain has finished.
pub struct EventPrinter<W> {
    handle: JoinHandle<W>,
}

impl<W: Write + Send + 'static> EventPrinter<W> {
    pub fn spawn(events: Subscription, format: OutputFormat, mut out: W) -> Self {
        let handle = std::thread::spawn(move || {
            while let Some(event) = events.recv() {
                if let Err(e) = write_event(&mut out, &event, format) {
                    warn!(error = %e, "failed to print event");
                    break;
                }
            }
            out
        });
        Self { handle }
    }

    /// Waits for the printer to write every remaining event and returns
    /// the writer.
    pub async fn finish(self) -> Option<W> {
        let handle = self.handle;
        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(out)) => Some(out),
            _ => {
                warn!("event printer did not shut down cleanly");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracksync_engine::{ConflictEvent, EventBus, Job};

    #[test]
    fn text_rendering() {
        let error = SyncEvent::SyncError {
            job: Job::push(),
            error: "no credential available".into(),
        };
        assert_eq!(
            render_event(&error, OutputFormat::Text).unwrap(),
            "error [push]: no credential available"
        );

        let conflict = SyncEvent::Conflict(ConflictEvent {
            ahead: 2,
            behind: 3,
            message: "Local and remote history have diverged".into(),
            has_conflicts: false,
        });
        assert_eq!(
            render_event(&conflict, OutputFormat::Text).unwrap(),
            "conflict: Local and remote history have diverged (ahead 2, behind 3)"
        );
    }

    #[test]
    fn json_rendering_is_tagged() {
        let event = SyncEvent::SyncError {
            job: Job::commit("edit"),
            error: "boom".into(),
        };
        let line = render_event(&event, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "sync_error");
        assert_eq!(value["job"]["kind"], "commit");
        assert_eq!(value["error"], "boom");
    }

    #[tokio::test]
    async fn printer_drains_every_event_before_finishing() {
        let bus = EventBus::new();
        let printer = EventPrinter::spawn(bus.subscribe(None), OutputFormat::Text, Vec::new());

        bus.emit(SyncEvent::SyncError {
            job: Job::push(),
            error: "no credential available".into(),
        });
        bus.emit(SyncEvent::Conflict(ConflictEvent {
            ahead: 1,
            behind: 1,
            message: "Merge conflicts detected after pull".into(),
            has_conflicts: true,
        }));
        drop(bus);

        let out = printer.finish().await.unwrap();
        let lines: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(
            lines,
            vec![
                "error [push]: no credential available".to_string(),
                "conflict: Merge conflicts detected after pull (ahead 1, behind 1), working tree has unmerged files".to_string(),
            ]
        );
    }
}
