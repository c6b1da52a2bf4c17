// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dsync hold <resource>` - Hold a lock until interrupted

use anyhow::Result;
use clap::Args;
use dsync_core::{ClusterConfig, LockMode};

use crate::cluster;

#[derive(Args)]
pub struct HoldArgs {
    /// Resource name to lock
    pub resource: String,

    /// Take a shared (read) lock instead of an exclusive one
    #[arg(long)]
    pub shared: bool,
}

pub async fn handle(args: HoldArgs, cluster: &ClusterConfig) -> Result<()> {
    let dsync = cluster::connect(cluster)?;
    let mode = super::mode(args.shared);
    let mut mutex = dsync.new_mutex(&args.resource);

    eprintln!("Waiting for {} lock on {}...", mode, args.resource);
    match mode {
        LockMode::Exclusive => mutex.lock().await,
        LockMode::Shared => mutex.rlock().await,
    }
    println!("Acquired {} lock on {}", mode, args.resource);

    tokio::signal::ctrl_c().await?;

    match mode {
        LockMode::Exclusive => mutex.unlock().await,
        LockMode::Shared => mutex.runlock().await,
    }
    dsync.flush_releases().await;
    println!("Released {}", args.resource);

    if dsync.pending_releases() > 0 {
        eprintln!(
            "warning: {} node(s) did not confirm the release; their entries remain",
            dsync.pending_releases()
        );
    }
    Ok(())
}
