// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquisition identities
//!
//! Every Lock/RLock attempt carries a fresh [`Uid`]. Nodes store it with the
//! grant and only release an entry when the same UID comes back, so a late or
//! duplicated release from an older attempt can never free a newer grant.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a single acquisition attempt
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub String);

impl Uid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates acquisition identities
pub trait UidGen: Clone + Send + Sync + 'static {
    fn next(&self) -> Uid;
}

/// UUID-based generator for production use
#[derive(Clone, Debug, Default)]
pub struct UuidGen;

impl UidGen for UuidGen {
    fn next(&self) -> Uid {
        Uid(uuid::Uuid::new_v4().to_string())
    }
}

/// Sequential generator for testing
#[derive(Clone, Debug)]
pub struct SequentialUidGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialUidGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialUidGen {
    fn default() -> Self {
        Self::new("uid")
    }
}

impl UidGen for SequentialUidGen {
    fn next(&self) -> Uid {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Uid(format!("{}-{}", self.prefix, n))
    }
}
