// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dsync status` - Show what every node holds

use std::fmt;

use anyhow::Result;
use dsync_core::{ClusterConfig, LockSnapshot, NetLocker};
use serde::Serialize;

use crate::cluster;
use crate::output::{self, OutputFormat};

/// One node's answer to a status query
#[derive(Debug, Serialize)]
pub struct NodeStatus {
    pub endpoint: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub locks: Vec<LockSnapshot>,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.reachable {
            return write!(
                f,
                "{}: down ({})",
                self.endpoint,
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        write!(
            f,
            "{}: up {}s, {} lock(s)",
            self.endpoint,
            self.uptime_secs.unwrap_or(0),
            self.locks.len()
        )?;
        for lock in &self.locks {
            let holders: Vec<String> = lock
                .holders
                .iter()
                .map(|h| format!("{} ({}, since {})", h.uid, h.owner, h.acquired_at.to_rfc3339()))
                .collect();
            write!(f, "\n  {:<24} {:<10} {}", lock.resource, lock.mode.to_string(), holders.join(", "))?;
        }
        Ok(())
    }
}

pub async fn handle(cluster: &ClusterConfig, format: OutputFormat) -> Result<()> {
    let nodes = cluster.node_set()?;
    let mut statuses = Vec::with_capacity(nodes.len());

    for locker in cluster::remote_lockers(&nodes) {
        let endpoint = locker.endpoint().to_string();
        let status = match locker.status().await {
            Ok((uptime_secs, locks)) => NodeStatus {
                endpoint,
                reachable: true,
                uptime_secs: Some(uptime_secs),
                error: None,
                locks,
            },
            Err(e) => NodeStatus {
                endpoint,
                reachable: false,
                uptime_secs: None,
                error: Some(e.to_string()),
                locks: Vec::new(),
            },
        };
        statuses.push(status);
    }

    output::print_list(&statuses, format);

    let up = statuses.iter().filter(|s| s.reachable).count();
    if matches!(format, OutputFormat::Text) {
        println!(
            "{}/{} nodes reachable (quorum {})",
            up,
            nodes.len(),
            nodes.quorum()
        );
    }
    Ok(())
}
