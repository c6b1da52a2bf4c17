// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! dsync-core: quorum-based distributed reader-writer locks
//!
//! This crate provides:
//! - The lock node table that arbitrates ownership on a single node
//! - The [`NetLocker`] seam for reaching a node, with local, traced and fake implementations
//! - The quorum coordinator ([`Dsync`]) and its per-resource handle ([`DRWMutex`])
//! - Node-set and retry configuration

pub mod args;
pub mod backoff;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod id;
pub mod locker;
pub mod node;

pub use args::{LockArgs, LockMode};
pub use backoff::Backoff;
pub use config::{quorum, ClusterConfig, DsyncConfig, NodeSet};
pub use coordinator::{DRWMutex, Dsync, Grant};
pub use error::DsyncError;
pub use id::{SequentialUidGen, Uid, UidGen, UuidGen};
pub use locker::{LocalLocker, LockerError, NetLocker, TracedLocker};
pub use node::{HolderSnapshot, LockNode, LockSnapshot};

#[cfg(any(test, feature = "test-support"))]
pub use locker::{FakeCluster, FakeLocker, LockerCall};
