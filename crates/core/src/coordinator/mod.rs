// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quorum coordinator
//!
//! [`Dsync`] owns the node set and one [`NetLocker`] per node. Handles created
//! with [`Dsync::new_mutex`] acquire by fanning a call out to every node and
//! counting grants against the majority threshold. A round that misses quorum
//! rolls back its partial grants and retries after a randomized delay, for as
//! long as it takes: acquisition blocks, it never fails.
//!
//! Known gaps, kept on purpose: nodes have no leases, so grants left behind by
//! a crashed client or a lost release stay until force-unlocked; and when more
//! than `N - quorum` nodes restart while a lock is held, a second holder can be
//! granted on the fresh nodes.

mod fanout;
mod mutex;
mod release;

pub use mutex::DRWMutex;

use crate::args::{LockArgs, LockMode};
use crate::config::{DsyncConfig, NodeSet};
use crate::error::DsyncError;
use crate::id::{UidGen, UuidGen};
use crate::locker::NetLocker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

/// One successful acquisition: the UID used and every node that granted it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub mode: LockMode,
    pub args: LockArgs,
    /// Indices into the node set, ascending; may exceed the quorum
    pub nodes: Vec<usize>,
}

struct Inner {
    nodes: NodeSet,
    lockers: Vec<Arc<dyn NetLocker>>,
    config: DsyncConfig,
    owner: String,
    shutdown: watch::Sender<bool>,
    pending_releases: AtomicUsize,
    /// Releases dispatched whose first attempt has not finished on every node
    releasing: watch::Sender<usize>,
}

/// Client-side coordinator for a fixed set of lock nodes
#[derive(Clone)]
pub struct Dsync<G: UidGen = UuidGen> {
    inner: Arc<Inner>,
    uid_gen: G,
}

impl Dsync<UuidGen> {
    /// Build a coordinator; `lockers[i]` must talk to `nodes[i]`
    pub fn new(
        nodes: NodeSet,
        lockers: Vec<Arc<dyn NetLocker>>,
        config: DsyncConfig,
    ) -> Result<Self, DsyncError> {
        if config.rpc_timeout.is_zero() {
            return Err(DsyncError::ZeroRpcTimeout);
        }
        if nodes.len() != lockers.len() {
            return Err(DsyncError::LockerCountMismatch {
                nodes: nodes.len(),
                lockers: lockers.len(),
            });
        }
        for (index, (expected, locker)) in nodes.endpoints().iter().zip(&lockers).enumerate() {
            if locker.endpoint() != expected {
                return Err(DsyncError::LockerEndpointMismatch {
                    index,
                    expected: expected.clone(),
                    actual: locker.endpoint().to_string(),
                });
            }
        }

        let (shutdown, _) = watch::channel(false);
        let (releasing, _) = watch::channel(0);
        let owner = uuid::Uuid::new_v4().to_string();
        tracing::debug!(
            owner,
            nodes = nodes.len(),
            quorum = nodes.quorum(),
            "coordinator created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                nodes,
                lockers,
                config,
                owner,
                shutdown,
                pending_releases: AtomicUsize::new(0),
                releasing,
            }),
            uid_gen: UuidGen,
        })
    }
}

impl<G: UidGen> Dsync<G> {
    /// Swap the UID generator (tests use sequential UIDs)
    pub fn with_uid_gen<H: UidGen>(self, uid_gen: H) -> Dsync<H> {
        Dsync {
            inner: self.inner,
            uid_gen,
        }
    }

    /// Create a handle for `resource`
    pub fn new_mutex(&self, resource: impl Into<String>) -> DRWMutex<G> {
        DRWMutex::new(resource.into(), self.clone())
    }

    pub fn nodes(&self) -> &NodeSet {
        &self.inner.nodes
    }

    pub fn quorum(&self) -> usize {
        self.inner.nodes.quorum()
    }

    pub fn config(&self) -> &DsyncConfig {
        &self.inner.config
    }

    /// Identity of this coordinator instance, sent along with every call
    pub fn owner(&self) -> &str {
        &self.inner.owner
    }

    /// Number of background release retries still running
    pub fn pending_releases(&self) -> usize {
        self.inner.pending_releases.load(Ordering::SeqCst)
    }

    /// Wait until every dispatched release has had one answer, or one
    /// timeout, from each of its nodes
    ///
    /// `unlock` returns as soon as its calls are dispatched; a process about to
    /// exit calls this so those calls are not cut off. Background retries for
    /// unreachable nodes are not waited for.
    pub async fn flush_releases(&self) {
        let mut releasing = self.inner.releasing.subscribe();
        // The sender lives in `inner`, which `self` keeps alive
        let _ = releasing.wait_for(|n| *n == 0).await;
    }

    /// Stop every background release retry
    ///
    /// Models the client process going away: whatever the retries had not yet
    /// delivered stays on the nodes as stale grants.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Block until `mode` is granted on `resource` by a quorum of nodes
    async fn acquire(&self, mode: LockMode, resource: &str) -> Grant {
        let mut attempt: u32 = 0;
        loop {
            if let Some(grant) = self.try_acquire(mode, resource).await {
                tracing::info!(
                    resource,
                    %mode,
                    uid = %grant.args.uid,
                    granted = grant.nodes.len(),
                    quorum = self.quorum(),
                    attempts = attempt + 1,
                    "lock acquired"
                );
                return grant;
            }

            let delay = self.inner.config.acquire_retry.delay(attempt);
            tracing::debug!(
                resource,
                %mode,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "quorum not reached, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Run a single acquisition round with a fresh UID
    ///
    /// The round runs as its own task. If the caller stops waiting (drops the
    /// lock future) and the round still wins, the grant is released instead of
    /// being left behind, whether or not it was already delivered.
    async fn try_acquire(&self, mode: LockMode, resource: &str) -> Option<Grant> {
        let args = LockArgs::new(resource, self.uid_gen.next(), self.inner.owner.clone());
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = inner.acquire_round(mode, args).await;
            if let Err(Some(grant)) = tx.send(outcome) {
                tracing::warn!(
                    resource = %grant.args.resource,
                    uid = %grant.args.uid,
                    "acquisition abandoned by caller, releasing grant"
                );
                inner.dispatch_release(grant);
            }
        });

        let mut outcome = RoundOutcome {
            rx,
            inner: Arc::clone(&self.inner),
        };
        (&mut outcome.rx).await.ok().flatten()
    }

    /// Send the release for `grant` to its nodes without waiting for answers
    fn release(&self, grant: Grant) {
        self.inner.dispatch_release(grant);
    }
}

/// Receiving end of one acquisition round
///
/// Dropped before the outcome is taken, it closes the channel and releases a
/// grant already sitting in it. A grant sent after the close is released by
/// the round task.
struct RoundOutcome {
    rx: oneshot::Receiver<Option<Grant>>,
    inner: Arc<Inner>,
}

impl Drop for RoundOutcome {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(Some(grant)) = self.rx.try_recv() {
            tracing::warn!(
                resource = %grant.args.resource,
                uid = %grant.args.uid,
                "grant delivered after caller left, releasing"
            );
            self.inner.dispatch_release(grant);
        }
    }
}

impl<G: UidGen> std::fmt::Debug for Dsync<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dsync")
            .field("nodes", &self.inner.nodes)
            .field("owner", &self.inner.owner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "dsync_tests.rs"]
mod tests;
