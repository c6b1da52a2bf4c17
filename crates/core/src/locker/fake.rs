// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lockers for testing failure scenarios without a network
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LockerError, NetLocker};
use crate::args::{LockArgs, LockMode};
use crate::config::NodeSet;
use crate::error::DsyncError;
use crate::node::LockNode;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded locker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerCall {
    pub op: &'static str,
    pub args: LockArgs,
    /// `None` when the node was unreachable
    pub answer: Option<bool>,
}

#[derive(Debug)]
struct FakeState {
    node: LockNode,
    reachable: bool,
    delay: Option<Duration>,
    calls: Vec<LockerCall>,
}

/// Fake locker whose node can crash, restart, be partitioned or slowed down
#[derive(Clone, Debug)]
pub struct FakeLocker {
    endpoint: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeLocker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: Arc::new(Mutex::new(FakeState {
                node: LockNode::new(),
                reachable: true,
                delay: None,
                calls: Vec::new(),
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current node table (replaced on restart)
    pub fn node(&self) -> LockNode {
        self.state().node.clone()
    }

    /// Process dies: state is lost and the node stops answering
    pub fn crash(&self) {
        let mut state = self.state();
        state.node = LockNode::new();
        state.reachable = false;
    }

    /// Process comes back with an empty table
    pub fn restart(&self) {
        let mut state = self.state();
        state.node = LockNode::new();
        state.reachable = true;
    }

    /// Network loss: the node keeps its table but cannot be reached
    pub fn partition(&self) {
        self.state().reachable = false;
    }

    /// Network repaired
    pub fn heal(&self) {
        self.state().reachable = true;
    }

    pub fn is_reachable(&self) -> bool {
        self.state().reachable
    }

    /// Delay every answer by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<LockerCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    async fn call(
        &self,
        op: &'static str,
        args: &LockArgs,
        apply: impl FnOnce(&LockNode, &LockArgs) -> bool,
    ) -> Result<bool, LockerError> {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let answer = state.reachable.then(|| apply(&state.node, args));
        state.calls.push(LockerCall {
            op,
            args: args.clone(),
            answer,
        });
        answer.ok_or_else(|| {
            LockerError::Unreachable(self.endpoint.clone(), "connection refused".to_string())
        })
    }
}

#[async_trait]
impl NetLocker for FakeLocker {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn lock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Exclusive.acquire_op(), args, |node, args| node.lock(args)).await
    }

    async fn unlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Exclusive.release_op(), args, |node, args| node.unlock(args)).await
    }

    async fn rlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Shared.acquire_op(), args, |node, args| node.rlock(args)).await
    }

    async fn runlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Shared.release_op(), args, |node, args| node.runlock(args)).await
    }
}

/// A set of fake lockers addressed as `node-0 .. node-{n-1}`
#[derive(Clone, Debug)]
pub struct FakeCluster {
    lockers: Vec<FakeLocker>,
}

impl FakeCluster {
    pub fn new(n: usize) -> Self {
        Self {
            lockers: (0..n).map(|i| FakeLocker::new(format!("node-{}", i))).collect(),
        }
    }

    pub fn node_set(&self) -> Result<NodeSet, DsyncError> {
        NodeSet::new(self.lockers.iter().map(|l| l.endpoint.clone()))
    }

    pub fn lockers(&self) -> Vec<Arc<dyn NetLocker>> {
        self.lockers
            .iter()
            .map(|l| Arc::new(l.clone()) as Arc<dyn NetLocker>)
            .collect()
    }

    /// Get the fake for node `index`; panics on a bad index (test helper)
    #[allow(clippy::panic)]
    pub fn locker(&self, index: usize) -> &FakeLocker {
        match self.lockers.get(index) {
            Some(locker) => locker,
            None => panic!("no fake node {}", index),
        }
    }

    pub fn crash(&self, index: usize) {
        self.locker(index).crash();
    }

    pub fn restart(&self, index: usize) {
        self.locker(index).restart();
    }

    pub fn partition(&self, index: usize) {
        self.locker(index).partition();
    }

    pub fn heal(&self, index: usize) {
        self.locker(index).heal();
    }

    /// Indices of nodes currently holding `resource` in `mode`
    pub fn holders(&self, resource: &str, mode: LockMode) -> Vec<usize> {
        self.lockers
            .iter()
            .enumerate()
            .filter(|(_, l)| {
                l.node()
                    .snapshot()
                    .iter()
                    .any(|s| s.resource == resource && s.mode == mode)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Check that no node holds any entry for `resource`
    pub fn is_free(&self, resource: &str) -> bool {
        self.lockers.iter().all(|l| l.node().is_free(resource))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
