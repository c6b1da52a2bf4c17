// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving the node set and building lockers for commands

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use dsync_core::{ClusterConfig, DsyncConfig, Dsync, NetLocker, NodeSet, TracedLocker};
use dsync_node::RemoteLocker;

/// Environment variable holding a comma-separated node list
pub const NODES_ENV: &str = "DSYNC_NODES";

/// Work out which nodes to talk to
///
/// `--nodes` wins over `DSYNC_NODES`, which wins over the `nodes` list of
/// `--config`. Timing settings always come from `--config` when given.
pub fn resolve(config: Option<&Path>, nodes: Option<&str>) -> Result<ClusterConfig> {
    let env_nodes = std::env::var(NODES_ENV).ok();
    resolve_with(config, nodes, env_nodes.as_deref())
}

fn resolve_with(
    config: Option<&Path>,
    nodes: Option<&str>,
    env_nodes: Option<&str>,
) -> Result<ClusterConfig> {
    let mut cluster = match config {
        Some(path) => ClusterConfig::load(path)
            .with_context(|| format!("loading cluster config {}", path.display()))?,
        None => ClusterConfig {
            nodes: Vec::new(),
            dsync: DsyncConfig::default(),
        },
    };

    if let Some(list) = nodes.or(env_nodes.filter(|s| !s.trim().is_empty())) {
        cluster.nodes = NodeSet::parse(list)?.endpoints().to_vec();
    }

    if cluster.nodes.is_empty() {
        bail!("no lock nodes given: use --nodes, {} or --config", NODES_ENV);
    }
    Ok(cluster)
}

/// One plain client per node, in node-set order
pub fn remote_lockers(nodes: &NodeSet) -> Vec<RemoteLocker> {
    nodes.endpoints().iter().map(RemoteLocker::new).collect()
}

/// Coordinator over traced TCP lockers
pub fn connect(cluster: &ClusterConfig) -> Result<Dsync> {
    let nodes = cluster.node_set()?;
    let lockers: Vec<Arc<dyn NetLocker>> = remote_lockers(&nodes)
        .into_iter()
        .map(|l| Arc::new(TracedLocker::new(l)) as Arc<dyn NetLocker>)
        .collect();
    Ok(Dsync::new(nodes, lockers, cluster.dsync.clone())?)
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
