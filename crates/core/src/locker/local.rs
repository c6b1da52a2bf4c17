// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process locker backed directly by a [`LockNode`]

use super::{LockerError, NetLocker};
use crate::args::LockArgs;
use crate::node::LockNode;
use async_trait::async_trait;

/// Locker for a node living in the same process; never fails
#[derive(Clone, Debug)]
pub struct LocalLocker {
    endpoint: String,
    node: LockNode,
}

impl LocalLocker {
    pub fn new(endpoint: impl Into<String>, node: LockNode) -> Self {
        Self {
            endpoint: endpoint.into(),
            node,
        }
    }

    pub fn node(&self) -> &LockNode {
        &self.node
    }
}

#[async_trait]
impl NetLocker for LocalLocker {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn lock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        Ok(self.node.lock(args))
    }

    async fn unlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        Ok(self.node.unlock(args))
    }

    async fn rlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        Ok(self.node.rlock(args))
    }

    async fn runlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        Ok(self.node.runlock(args))
    }
}
