//! Status command - local view of the working directory against its upstream.

use crate::context::Context;
use crate::error::CliResult;
use crate::output::OutputFormat;
use serde::Serialize;
use std::path::PathBuf;
use tracksync_engine::SyncStatus;
use tracksync_vcs::{BranchComparison, VersionControl};

#[derive(Debug, Serialize)]
struct StatusReport {
    branch: String,
    status: SyncStatus,
    ahead: u32,
    behind: u32,
    diverged: bool,
    conflicted_paths: Vec<PathBuf>,
    token: bool,
}

impl StatusReport {
    fn new(
        branch: String,
        comparison: BranchComparison,
        conflicted_paths: Vec<PathBuf>,
        token: bool,
    ) -> Self {
        let status = if comparison.diverged || !conflicted_paths.is_empty() {
            SyncStatus::Conflict
        } else {
            SyncStatus::Idle
        };
        Self {
            branch,
            status,
            ahead: comparison.ahead,
            behind: comparison.behind,
            diverged: comparison.diverged,
            conflicted_paths,
            token,
        }
    }

    fn print_text(&self) {
        println!("Branch:    {}", self.branch);
        println!("Status:    {}", self.status);
        println!("Ahead:     {}", self.ahead);
        println!("Behind:    {}", self.behind);
        println!("Token:     {}", if self.token { "set" } else { "not set" });
        if !self.conflicted_paths.is_empty() {
            println!("Conflicted files:");
            for path in &self.conflicted_paths {
                println!("  {}", path.display());
            }
        }
        if self.status == SyncStatus::Conflict {
            println!();
            println!("Run `tracksync resolve --theirs|--ours|--abort` to continue.");
        }
    }
}

pub async fn run(ctx: &Context, fetch: bool, format: OutputFormat) -> CliResult<()> {
    let git = ctx.git();
    if fetch {
        git.fetch(&ctx.require_credential()?).await?;
    }

    let report = StatusReport::new(
        git.current_branch().await?,
        git.compare_branches().await?,
        git.conflicted_paths().await?,
        ctx.credential().is_some(),
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => report.print_text(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_reports_conflict() {
        let report = StatusReport::new("main".into(), BranchComparison::new(2, 3), vec![], true);
        assert_eq!(report.status, SyncStatus::Conflict);

        let report = StatusReport::new("main".into(), BranchComparison::new(0, 3), vec![], true);
        assert_eq!(report.status, SyncStatus::Idle);
    }

    #[test]
    fn unmerged_files_report_conflict() {
        let report = StatusReport::new(
            "main".into(),
            BranchComparison::default(),
            vec![PathBuf::from("issues/1.json")],
            false,
        );
        assert_eq!(report.status, SyncStatus::Conflict);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "conflict");
        assert_eq!(json["conflicted_paths"][0], "issues/1.json");
    }
}
