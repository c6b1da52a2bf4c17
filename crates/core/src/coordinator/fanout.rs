// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One acquisition round: fan out to every node, fan in under a deadline

use super::{Grant, Inner};
use crate::args::{LockArgs, LockMode};
use crate::locker::{self, LockerError};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Answer of one node in one round
struct Vote {
    index: usize,
    outcome: Result<bool, LockerError>,
}

/// Votes collected before the deadline
#[derive(Debug, Default)]
struct Tally {
    granted: Vec<usize>,
    denied: usize,
    failed: usize,
    late: usize,
}

impl Tally {
    fn record(&mut self, vote: Vote) {
        match vote.outcome {
            Ok(true) => self.granted.push(vote.index),
            Ok(false) => self.denied += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl Inner {
    /// Ask every node for `mode` on `args.resource` and decide by majority
    ///
    /// Returns the grant when at least a quorum said yes. Otherwise the nodes
    /// that did say yes are told to release and `None` is returned. Answers
    /// that miss the deadline count as denials; they are drained in the
    /// background and any late grant is released with the same UID.
    pub(super) async fn acquire_round(
        self: &Arc<Self>,
        mode: LockMode,
        args: LockArgs,
    ) -> Option<Grant> {
        let mut calls = JoinSet::new();
        for (index, node) in self.lockers.iter().enumerate() {
            let node = Arc::clone(node);
            let args = args.clone();
            calls.spawn(async move {
                let outcome = locker::acquire(node.as_ref(), mode, &args).await;
                Vote { index, outcome }
            });
        }

        let deadline = Instant::now() + self.config.rpc_timeout;
        let mut tally = Tally::default();
        while !calls.is_empty() {
            let joined = tokio::time::timeout_at(deadline, calls.join_next()).await;
            match joined {
                Ok(Some(Ok(vote))) => tally.record(vote),
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "lock call task failed");
                    tally.failed += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    tally.late = calls.len();
                    self.drain_late(calls, mode, args.clone());
                    break;
                }
            }
        }

        let quorum = self.nodes.quorum();
        tracing::debug!(
            resource = %args.resource,
            %mode,
            uid = %args.uid,
            granted = tally.granted.len(),
            denied = tally.denied,
            failed = tally.failed,
            late = tally.late,
            quorum,
            "round tallied"
        );

        tally.granted.sort_unstable();
        let grant = Grant {
            mode,
            args,
            nodes: tally.granted,
        };

        if grant.nodes.len() >= quorum {
            return Some(grant);
        }

        if !grant.nodes.is_empty() {
            self.release_grant(&grant).await;
        }
        None
    }

    /// Wait for the stragglers of a decided round and undo their grants
    fn drain_late(self: &Arc<Self>, mut calls: JoinSet<Vote>, mode: LockMode, args: LockArgs) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(joined) = calls.join_next().await {
                let Ok(vote) = joined else { continue };
                if matches!(vote.outcome, Ok(true)) {
                    tracing::debug!(
                        resource = %args.resource,
                        uid = %args.uid,
                        node = vote.index,
                        "releasing late grant"
                    );
                    let late = Grant {
                        mode,
                        args: args.clone(),
                        nodes: vec![vote.index],
                    };
                    inner.release_grant(&late).await;
                }
            }
        });
    }
}
