// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Releasing grants, with detached retries for unreachable nodes

use super::{Grant, Inner};
use crate::args::{LockArgs, LockMode};
use crate::locker;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Decrements the pending-release gauge when a retry task ends, however it ends
struct PendingGuard(Arc<Inner>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.pending_releases.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks one dispatched release as finished with its first attempts
struct DispatchGuard(Arc<Inner>);

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.0.releasing.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Inner {
    /// Release `grant` on a detached task
    ///
    /// Nothing the caller does afterwards, including dropping its future,
    /// cancels the calls. Counted until each node has had its first attempt.
    pub(super) fn dispatch_release(self: &Arc<Self>, grant: Grant) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                resource = %grant.args.resource,
                uid = %grant.args.uid,
                "no runtime to release on, node entries remain"
            );
            return;
        };

        self.releasing.send_modify(|n| *n += 1);
        let guard = DispatchGuard(Arc::clone(self));
        runtime.spawn(async move {
            let inner = &guard.0;
            inner.release_grant(&grant).await;
            tracing::info!(
                resource = %grant.args.resource,
                mode = %grant.mode,
                uid = %grant.args.uid,
                nodes = grant.nodes.len(),
                "lock released"
            );
        });
    }

    /// Tell every node recorded in `grant` to release it
    ///
    /// Each node gets one attempt bounded by the RPC timeout. A node that
    /// answers (true or false) is done: false means it no longer holds the
    /// UID. A node that cannot be reached gets a background retry loop, and
    /// this call returns without waiting for it.
    pub(super) async fn release_grant(self: &Arc<Self>, grant: &Grant) {
        let mut calls = JoinSet::new();
        for &index in &grant.nodes {
            let Some(node) = self.lockers.get(index).cloned() else {
                continue;
            };
            let args = grant.args.clone();
            let mode = grant.mode;
            let timeout = self.config.rpc_timeout;
            calls.spawn(async move {
                let outcome =
                    tokio::time::timeout(timeout, locker::release(node.as_ref(), mode, &args)).await;
                (index, outcome)
            });
        }

        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok((index, Ok(Ok(released)))) => {
                    if !released {
                        tracing::debug!(
                            resource = %grant.args.resource,
                            uid = %grant.args.uid,
                            node = index,
                            "node no longer held the grant"
                        );
                    }
                }
                Ok((index, Ok(Err(e)))) => {
                    tracing::warn!(node = index, error = %e, "release failed, retrying in background");
                    self.spawn_release_retry(index, grant.mode, grant.args.clone());
                }
                Ok((index, Err(_))) => {
                    tracing::warn!(node = index, "release timed out, retrying in background");
                    self.spawn_release_retry(index, grant.mode, grant.args.clone());
                }
                Err(e) => tracing::warn!(error = %e, "release task failed"),
            }
        }
    }

    /// Keep retrying a release to one node until it answers, the attempt cap
    /// is reached, or the coordinator shuts down
    fn spawn_release_retry(self: &Arc<Self>, index: usize, mode: LockMode, args: LockArgs) {
        let Some(node) = self.lockers.get(index).cloned() else {
            return;
        };
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            tracing::debug!(node = index, uid = %args.uid, "coordinator stopped, not retrying release");
            return;
        }

        self.pending_releases.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard(Arc::clone(self));

        tokio::spawn(async move {
            let inner = &guard.0;
            let mut attempt: u32 = 0;
            loop {
                if let Some(max) = inner.config.release_max_attempts {
                    if attempt >= max {
                        tracing::warn!(
                            endpoint = node.endpoint(),
                            resource = %args.resource,
                            uid = %args.uid,
                            attempts = attempt,
                            "giving up on release, grant left on node"
                        );
                        break;
                    }
                }

                let delay = inner.config.release_retry.delay(attempt);
                tokio::select! {
                    // The flag only ever flips to true
                    _ = shutdown.changed() => {
                        tracing::debug!(endpoint = node.endpoint(), uid = %args.uid, "release retry stopped");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt = attempt.saturating_add(1);

                let outcome = tokio::time::timeout(
                    inner.config.rpc_timeout,
                    locker::release(node.as_ref(), mode, &args),
                )
                .await;
                match outcome {
                    Ok(Ok(released)) => {
                        tracing::info!(
                            endpoint = node.endpoint(),
                            resource = %args.resource,
                            uid = %args.uid,
                            released,
                            attempts = attempt,
                            "background release delivered"
                        );
                        break;
                    }
                    Ok(Err(e)) => tracing::debug!(attempt, error = %e, "release retry failed"),
                    Err(_) => tracing::debug!(attempt, "release retry timed out"),
                }
            }
        });
    }
}
