// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced locker wrapper for consistent observability

use super::{LockerError, NetLocker};
use crate::args::{LockArgs, LockMode};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any NetLocker
#[derive(Clone, Debug)]
pub struct TracedLocker<L> {
    inner: L,
}

impl<L> TracedLocker<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<L: NetLocker> TracedLocker<L> {
    async fn call<'a, F>(
        &'a self,
        op: &'static str,
        args: &'a LockArgs,
        f: F,
    ) -> Result<bool, LockerError>
    where
        F: std::future::Future<Output = Result<bool, LockerError>> + Send + 'a,
    {
        let span = tracing::debug_span!(
            "locker.call",
            op,
            endpoint = self.inner.endpoint(),
            resource = %args.resource,
            uid = %args.uid,
        );

        async move {
            let start = std::time::Instant::now();
            let result = f.await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(granted) => tracing::debug!(granted, elapsed_ms, "answered"),
                // Unreachable nodes are routine while a cluster is degraded
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<L: NetLocker> NetLocker for TracedLocker<L> {
    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    async fn lock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Exclusive.acquire_op(), args, self.inner.lock(args)).await
    }

    async fn unlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Exclusive.release_op(), args, self.inner.unlock(args)).await
    }

    async fn rlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Shared.acquire_op(), args, self.inner.rlock(args)).await
    }

    async fn runlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(LockMode::Shared.release_op(), args, self.inner.runlock(args)).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
