// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dsync - distributed lock CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cluster;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{force_unlock, hold, run, status};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "dsync",
    version,
    about = "Quorum-based distributed locks over a set of lockd nodes"
)]
struct Cli {
    /// Cluster config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comma-separated node list, overrides DSYNC_NODES and the config file
    #[arg(long, global = true)]
    nodes: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a lock and hold it until Ctrl-C
    Hold(hold::HoldArgs),
    /// Run a command while holding a lock
    Run(run::RunArgs),
    /// Show reachability and held locks of every node
    Status,
    /// Remove a resource from every node regardless of holders
    ForceUnlock(force_unlock::ForceUnlockArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let cluster = cluster::resolve(cli.config.as_deref(), cli.nodes.as_deref())?;

    match cli.command {
        Commands::Hold(args) => hold::handle(args, &cluster).await?,
        Commands::Run(args) => {
            let code = run::handle(args, &cluster).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Status => status::handle(&cluster, cli.output).await?,
        Commands::ForceUnlock(args) => force_unlock::handle(args, &cluster).await?,
    }

    Ok(())
}

/// Logs go to stderr; quiet unless RUST_LOG asks for more
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
