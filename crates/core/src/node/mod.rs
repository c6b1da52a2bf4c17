// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock Node: the authoritative, per-node arbiter of resource ownership
//!
//! A node knows nothing about quorum. It answers each Lock/Unlock/RLock/RUnlock
//! call from its own table under a single table-wide critical section.

mod table;

pub use table::{HolderSnapshot, LockEntry, LockInput, LockSnapshot, LockTable};

use crate::args::{LockArgs, LockMode};
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// Shareable handle to one node's lock table
#[derive(Clone, Debug, Default)]
pub struct LockNode {
    table: Arc<Mutex<LockTable>>,
}

impl LockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self, args: &LockArgs) -> bool {
        self.apply(
            "lock",
            args,
            LockInput::Lock {
                uid: args.uid.clone(),
                owner: args.owner.clone(),
            },
        )
    }

    pub fn rlock(&self, args: &LockArgs) -> bool {
        self.apply(
            "rlock",
            args,
            LockInput::RLock {
                uid: args.uid.clone(),
                owner: args.owner.clone(),
            },
        )
    }

    pub fn unlock(&self, args: &LockArgs) -> bool {
        self.apply(
            "unlock",
            args,
            LockInput::Unlock {
                uid: args.uid.clone(),
            },
        )
    }

    pub fn runlock(&self, args: &LockArgs) -> bool {
        self.apply(
            "runlock",
            args,
            LockInput::RUnlock {
                uid: args.uid.clone(),
            },
        )
    }

    /// Acquire in the given mode
    pub fn acquire(&self, mode: LockMode, args: &LockArgs) -> bool {
        match mode {
            LockMode::Exclusive => self.lock(args),
            LockMode::Shared => self.rlock(args),
        }
    }

    /// Release in the given mode
    pub fn release(&self, mode: LockMode, args: &LockArgs) -> bool {
        match mode {
            LockMode::Exclusive => self.unlock(args),
            LockMode::Shared => self.runlock(args),
        }
    }

    /// Remove a resource entry regardless of who holds it
    pub fn force_unlock(&self, resource: &str) -> bool {
        let removed = self
            .table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(resource, LockInput::ForceUnlock, Utc::now());
        if removed {
            tracing::warn!(resource, "entry force-unlocked");
        }
        removed
    }

    pub fn snapshot(&self) -> Vec<LockSnapshot> {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot()
    }

    pub fn is_free(&self, resource: &str) -> bool {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_free(resource)
    }

    fn apply(&self, op: &'static str, args: &LockArgs, input: LockInput) -> bool {
        let granted = self
            .table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(&args.resource, input, Utc::now());
        tracing::debug!(
            op,
            resource = %args.resource,
            uid = %args.uid,
            owner = %args.owner,
            granted,
        );
        granted
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
