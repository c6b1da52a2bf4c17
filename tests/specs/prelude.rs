//! Shared helpers for specs
//!
//! `TestCluster` runs real `lockd` servers in-process on loopback. Killing a
//! node stops its server and drops its lock table; restarting binds the same
//! address again with an empty table.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dsync_core::{Backoff, Dsync, DsyncConfig, LockArgs, LockMode, NetLocker, NodeSet, Uid};
use dsync_node::{startup, NodeConfig, RemoteLocker};
use predicates::prelude::*;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Long enough for dozens of retry rounds at spec timings
pub const BLOCKED: Duration = Duration::from_secs(3);

struct Running {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct TestNode {
    endpoint: String,
    running: Option<Running>,
}

pub struct TestCluster {
    nodes: Vec<TestNode>,
}

impl TestCluster {
    pub async fn start(n: usize) -> Self {
        let mut nodes = Vec::with_capacity(n);
        for _ in 0..n {
            let (endpoint, running) = launch("127.0.0.1:0").await;
            nodes.push(TestNode {
                endpoint,
                running: Some(running),
            });
        }
        Self { nodes }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.endpoint.clone()).collect()
    }

    /// Stop node `i`; its lock table is gone
    pub async fn kill(&mut self, i: usize) {
        if let Some(running) = self.nodes[i].running.take() {
            let _ = running.stop.send(());
            running.task.await.unwrap();
        }
    }

    /// Bring node `i` back on its old address with an empty table
    pub async fn restart(&mut self, i: usize) {
        assert!(self.nodes[i].running.is_none(), "node {} still running", i);
        let (_, running) = launch(&self.nodes[i].endpoint).await;
        self.nodes[i].running = Some(running);
    }

    pub fn locker(&self, i: usize) -> RemoteLocker {
        RemoteLocker::new(&self.nodes[i].endpoint)
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(250))
    }

    /// Coordinator with timings short enough for tests
    pub fn coordinator(&self) -> Dsync {
        let nodes = NodeSet::new(self.endpoints()).unwrap();
        let lockers: Vec<Arc<dyn NetLocker>> = (0..self.nodes.len())
            .map(|i| Arc::new(self.locker(i)) as Arc<dyn NetLocker>)
            .collect();
        let config = DsyncConfig::default()
            .with_rpc_timeout(Duration::from_millis(300))
            .with_acquire_retry(Backoff::new(
                Duration::from_millis(20),
                Duration::from_millis(100),
                Duration::from_millis(20),
            ))
            .with_release_retry(Backoff::new(
                Duration::from_millis(50),
                Duration::from_millis(200),
                Duration::ZERO,
            ));
        Dsync::new(nodes, lockers, config).unwrap()
    }

    /// Leave an exclusive grant on node `i` as a crashed client would
    pub async fn plant_stale(&self, i: usize, resource: &str) {
        let args = LockArgs::new(resource, Uid::new(format!("stale-{}", i)), "crashed-client");
        assert!(self.locker(i).lock(&args).await.unwrap());
    }

    /// Indices of running nodes holding `resource` in `mode`
    pub async fn holders(&self, resource: &str, mode: LockMode) -> Vec<usize> {
        let mut holders = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.running.is_none() {
                continue;
            }
            let (_, locks) = self.locker(i).status().await.unwrap();
            if locks.iter().any(|l| l.resource == resource && l.mode == mode) {
                holders.push(i);
            }
        }
        holders
    }
}

async fn launch(listen: &str) -> (String, Running) {
    let state = startup(&NodeConfig::new(listen)).await.unwrap();
    let endpoint = state.local_addr().unwrap().to_string();
    let (stop, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(state.run(async {
        let _ = rx.await;
    }));
    (endpoint, Running { stop, task })
}

/// True when `fut` is still pending after `duration`
pub async fn still_blocked<F: Future>(fut: F, duration: Duration) -> bool {
    tokio::time::timeout(duration, fut).await.is_err()
}

// =============================================================================
// CLI helpers
// =============================================================================

pub struct Cli {
    cmd: assert_cmd::Command,
}

pub fn dsync() -> Cli {
    let mut cmd = assert_cmd::Command::cargo_bin("dsync").unwrap();
    cmd.env_remove("DSYNC_NODES");
    Cli { cmd }
}

pub fn lockd() -> Cli {
    Cli {
        cmd: assert_cmd::Command::cargo_bin("lockd").unwrap(),
    }
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().failure(),
        }
    }
}

pub struct RunAssert {
    assert: assert_cmd::assert::Assert,
}

impl RunAssert {
    pub fn stdout_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(expected)),
        }
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(expected)),
        }
    }
}
