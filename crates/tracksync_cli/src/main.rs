//! tracksync CLI
//!
//! Command-line host that drives a sync queue against a git working
//! directory.
//!
//! # Commands
//!
//! - `status` - Show branch divergence, conflicted paths and queue state
//! - `sync` - Commit the tracked subtree and push it
//! - `pull` - Merge remote changes
//! - `resolve` - Settle a conflict on one side, or abort the merge
//! - `watch` - Commit on every stdin line and push periodically

mod commands;
mod context;
mod error;
mod output;

use clap::{ArgGroup, Parser, Subcommand};
use context::Context;
use output::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracksync_engine::Resolution;

/// Keep a directory of issue files in sync with its git remote.
#[derive(Parser)]
#[command(name = "tracksync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the git working directory
    #[arg(global = true, short, long, env = "TRACKSYNC_DIR", default_value = ".")]
    path: PathBuf,

    /// Subtree to stage, relative to the working directory
    #[arg(global = true, long, env = "TRACKSYNC_TRACKED_PATH", default_value = ".")]
    tracked: PathBuf,

    /// Access token for the remote
    #[arg(global = true, long, env = "TRACKSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Branch to push to instead of the upstream
    #[arg(global = true, long, env = "TRACKSYNC_BRANCH")]
    branch: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show branch divergence, conflicted paths and queue state
    Status {
        /// Fetch from the remote before comparing (needs a token)
        #[arg(long)]
        fetch: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Commit the tracked subtree and push it
    Sync {
        /// Commit message
        #[arg(short, long, default_value = "Update tracked files")]
        message: String,

        /// Output format for events
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Merge remote changes into the working directory
    Pull {
        /// Output format for events
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve a sync conflict
    #[command(group(ArgGroup::new("side").required(true).args(["theirs", "ours", "abort"])))]
    Resolve {
        /// Keep the remote version of every conflicted file
        #[arg(long)]
        theirs: bool,

        /// Keep the local version of every conflicted file
        #[arg(long)]
        ours: bool,

        /// Abort the merge in progress
        #[arg(long)]
        abort: bool,

        /// Commit message for the resolution
        #[arg(short, long)]
        message: Option<String>,

        /// Output format for events
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Commit on every stdin line and push periodically until Ctrl-C
    Watch {
        /// Quiet period before a commit, in milliseconds
        #[arg(long, env = "TRACKSYNC_DEBOUNCE_MS", default_value = "2000")]
        debounce_ms: u64,

        /// Interval of the periodic push check, in seconds (0 disables it)
        #[arg(long, env = "TRACKSYNC_PUSH_INTERVAL", default_value = "30")]
        push_interval: u64,

        /// Output format for events
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::new(cli.path, cli.tracked, cli.token, cli.branch);

    match cli.command {
        Commands::Status { fetch, format } => {
            commands::status::run(&ctx, fetch, format).await?;
        }
        Commands::Sync { message, format } => {
            commands::sync::run(&ctx, &message, format).await?;
        }
        Commands::Pull { format } => {
            commands::pull::run(&ctx, format).await?;
        }
        Commands::Resolve {
            theirs,
            ours,
            abort: _,
            message,
            format,
        } => {
            let resolution = if theirs {
                Resolution::AcceptTheirs
            } else if ours {
                Resolution::AcceptOurs
            } else {
                Resolution::Abort
            };
            commands::resolve::run(&ctx, resolution, message, format).await?;
        }
        Commands::Watch {
            debounce_ms,
            push_interval,
            format,
        } => {
            commands::watch::run(&ctx, debounce_ms, push_interval, format).await?;
        }
        Commands::Version => {
            println!("tracksync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
