// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dsync force-unlock <resource>` - Drop a resource on every node

use anyhow::{bail, Result};
use clap::Args;
use dsync_core::{ClusterConfig, NetLocker};

use crate::cluster;

#[derive(Args)]
pub struct ForceUnlockArgs {
    /// Resource to clear, whoever holds it
    pub resource: String,
}

pub async fn handle(args: ForceUnlockArgs, cluster: &ClusterConfig) -> Result<()> {
    let nodes = cluster.node_set()?;
    let mut failures = 0;

    for locker in cluster::remote_lockers(&nodes) {
        let endpoint = locker.endpoint().to_string();
        match locker.force_unlock(&args.resource).await {
            Ok(true) => println!("{}: removed", endpoint),
            Ok(false) => println!("{}: not held", endpoint),
            Err(e) => {
                failures += 1;
                println!("{}: error: {}", endpoint, e);
            }
        }
    }

    if failures == nodes.len() {
        bail!("no node could be reached");
    }
    Ok(())
}
