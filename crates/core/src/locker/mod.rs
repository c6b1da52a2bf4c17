// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport seam between the quorum coordinator and the lock nodes
//!
//! A [`NetLocker`] delivers one call to one node and returns the node's
//! boolean answer, or a [`LockerError`] when the node could not be reached.
//! The coordinator turns every error into a denial vote.

mod local;
mod traced;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use local::LocalLocker;
pub use traced::TracedLocker;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCluster, FakeLocker, LockerCall};

use crate::args::{LockArgs, LockMode};
use async_trait::async_trait;
use thiserror::Error;

/// Per-node transport failures
#[derive(Debug, Clone, Error)]
pub enum LockerError {
    #[error("node {0} unreachable: {1}")]
    Unreachable(String, String),
    #[error("node {0} timed out")]
    Timeout(String),
    #[error("protocol error talking to {0}: {1}")]
    Protocol(String, String),
    #[error("node {0} reported: {1}")]
    Remote(String, String),
}

/// A client for one lock node
#[async_trait]
pub trait NetLocker: Send + Sync + 'static {
    /// Address this locker talks to
    fn endpoint(&self) -> &str;

    async fn lock(&self, args: &LockArgs) -> Result<bool, LockerError>;

    async fn unlock(&self, args: &LockArgs) -> Result<bool, LockerError>;

    async fn rlock(&self, args: &LockArgs) -> Result<bool, LockerError>;

    async fn runlock(&self, args: &LockArgs) -> Result<bool, LockerError>;
}

/// Acquire through `locker` in the given mode
pub async fn acquire(
    locker: &dyn NetLocker,
    mode: LockMode,
    args: &LockArgs,
) -> Result<bool, LockerError> {
    match mode {
        LockMode::Exclusive => locker.lock(args).await,
        LockMode::Shared => locker.rlock(args).await,
    }
}

/// Release through `locker` in the given mode
pub async fn release(
    locker: &dyn NetLocker,
    mode: LockMode,
    args: &LockArgs,
) -> Result<bool, LockerError> {
    match mode {
        LockMode::Exclusive => locker.unlock(args).await,
        LockMode::Shared => locker.runlock(args).await,
    }
}
