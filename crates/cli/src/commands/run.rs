// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dsync run <resource> -- <cmd> [args]` - Run a command under a lock

use anyhow::{Context, Result};
use clap::Args;
use dsync_core::{ClusterConfig, LockMode};
use tokio::process::Command;

use crate::cluster;

#[derive(Args)]
pub struct RunArgs {
    /// Resource name to lock
    pub resource: String,

    /// Take a shared (read) lock instead of an exclusive one
    #[arg(long)]
    pub shared: bool,

    /// Command and its arguments, after `--`
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Returns the command's exit code
pub async fn handle(args: RunArgs, cluster: &ClusterConfig) -> Result<i32> {
    let dsync = cluster::connect(cluster)?;
    let mode = super::mode(args.shared);
    let mut mutex = dsync.new_mutex(&args.resource);

    let Some((program, program_args)) = args.command.split_first() else {
        anyhow::bail!("no command given");
    };

    match mode {
        LockMode::Exclusive => mutex.lock().await,
        LockMode::Shared => mutex.rlock().await,
    }
    tracing::info!(resource = %args.resource, %mode, program, "running command under lock");

    let status = Command::new(program).args(program_args).status().await;

    // Release whether or not the command could be started
    match mode {
        LockMode::Exclusive => mutex.unlock().await,
        LockMode::Shared => mutex.runlock().await,
    }
    dsync.flush_releases().await;

    let status = status.with_context(|| format!("failed to run {}", program))?;
    Ok(status.code().unwrap_or(1))
}
