// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Arguments shared by every node lock operation

use crate::id::Uid;
use serde::{Deserialize, Serialize};

/// Whether a grant is exclusive (writer) or shared (reader)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    Exclusive,
    Shared,
}

impl LockMode {
    /// Name of the node operation that acquires in this mode
    pub fn acquire_op(self) -> &'static str {
        match self {
            LockMode::Exclusive => "lock",
            LockMode::Shared => "rlock",
        }
    }

    /// Name of the node operation that releases in this mode
    pub fn release_op(self) -> &'static str {
        match self {
            LockMode::Exclusive => "unlock",
            LockMode::Shared => "runlock",
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockMode::Exclusive => write!(f, "exclusive"),
            LockMode::Shared => write!(f, "shared"),
        }
    }
}

/// Payload of a Lock/Unlock/RLock/RUnlock call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockArgs {
    /// Resource being locked
    pub resource: String,
    /// Identity of the acquisition attempt
    pub uid: Uid,
    /// Coordinator instance that issued the call (informational only)
    pub owner: String,
}

impl LockArgs {
    pub fn new(resource: impl Into<String>, uid: Uid, owner: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            uid,
            owner: owner.into(),
        }
    }
}
