// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node set and coordinator configuration

use crate::backoff::Backoff;
use crate::error::DsyncError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Ordered, validated list of lock node endpoints
///
/// Fixed for the lifetime of a coordinator; membership changes are not
/// supported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSet {
    endpoints: Vec<String>,
}

impl NodeSet {
    pub fn new<I, S>(endpoints: I) -> Result<Self, DsyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints
            .into_iter()
            .map(|e| e.into().trim().to_string())
            .collect();

        if endpoints.is_empty() {
            return Err(DsyncError::NoNodes);
        }

        let mut seen = HashSet::new();
        for (index, endpoint) in endpoints.iter().enumerate() {
            if endpoint.is_empty() {
                return Err(DsyncError::BlankEndpoint(index));
            }
            if !seen.insert(endpoint.as_str()) {
                return Err(DsyncError::DuplicateEndpoint(endpoint.clone()));
            }
        }

        Ok(Self { endpoints })
    }

    /// Parse a comma-separated endpoint list, e.g. `"a:1,b:2"`
    pub fn parse(list: &str) -> Result<Self, DsyncError> {
        Self::new(list.split(',').filter(|s| !s.trim().is_empty()))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Grants needed for both exclusive and shared acquisition
    pub fn quorum(&self) -> usize {
        quorum(self.endpoints.len())
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

/// Majority threshold for `n` nodes
pub fn quorum(n: usize) -> usize {
    n / 2 + 1
}

/// Timing knobs of the quorum coordinator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsyncConfig {
    /// Deadline for collecting the answers of one fan-out round
    #[serde(with = "humantime_serde")]
    pub rpc_timeout: Duration,
    /// Delay between acquisition rounds that missed quorum
    pub acquire_retry: Backoff,
    /// Delay between background release attempts to an unreachable node
    pub release_retry: Backoff,
    /// Give up on a background release after this many attempts
    pub release_max_attempts: Option<u32>,
}

impl Default for DsyncConfig {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(1),
            acquire_retry: Backoff::acquire_default(),
            release_retry: Backoff::release_default(),
            release_max_attempts: None,
        }
    }
}

impl DsyncConfig {
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn with_acquire_retry(mut self, backoff: Backoff) -> Self {
        self.acquire_retry = backoff;
        self
    }

    pub fn with_release_retry(mut self, backoff: Backoff) -> Self {
        self.release_retry = backoff;
        self
    }

    pub fn with_release_max_attempts(mut self, attempts: u32) -> Self {
        self.release_max_attempts = Some(attempts);
        self
    }
}

/// On-disk cluster description
///
/// ```toml
/// nodes = ["127.0.0.1:12345", "127.0.0.1:12346", "127.0.0.1:12347"]
/// rpc_timeout = "500ms"
///
/// [acquire_retry]
/// initial = "100ms"
/// max = "1s"
/// jitter = "100ms"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub nodes: Vec<String>,
    #[serde(flatten)]
    pub dsync: DsyncConfig,
}

impl ClusterConfig {
    pub fn from_toml(content: &str) -> Result<Self, DsyncError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, DsyncError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DsyncError::ReadConfig(path.to_path_buf(), e))?;
        Self::from_toml(&content)
    }

    /// Validate the node list
    pub fn node_set(&self) -> Result<NodeSet, DsyncError> {
        NodeSet::new(self.nodes.iter().cloned())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
