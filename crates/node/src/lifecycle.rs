// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node lifecycle management: startup and shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;

use dsync_core::LockNode;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::server::{self, ServerState};

/// Default listen address for `lockd`
pub const DEFAULT_LISTEN: &str = "127.0.0.1:7390";

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address to bind, `host:port`
    pub listen: String,
    /// Log file; logs go to stderr when unset
    pub log_path: Option<PathBuf>,
}

impl NodeConfig {
    pub fn new(listen: impl Into<String>) -> Self {
        Self {
            listen: listen.into(),
            log_path: None,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LISTEN)
    }
}

/// A bound node that has not started serving yet
pub struct NodeState {
    pub config: NodeConfig,
    pub listener: TcpListener,
    /// Lock table; lives exactly as long as the process
    pub node: LockNode,
}

impl NodeState {
    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, LifecycleError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves; the lock table is dropped afterwards
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        server::serve(self.listener, ServerState::new(self.node), shutdown).await;
        info!(listen = %self.config.listen, "Node stopped, lock table discarded");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Invalid log path: {0}")]
    InvalidLogPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind the listener with an empty lock table
pub async fn startup(config: &NodeConfig) -> Result<NodeState, LifecycleError> {
    let listener = TcpListener::bind(&config.listen)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.listen.clone(), e))?;

    info!(
        listen = %config.listen,
        local_addr = ?listener.local_addr().ok(),
        "Node started"
    );

    Ok(NodeState {
        config: config.clone(),
        listener,
        node: LockNode::new(),
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
