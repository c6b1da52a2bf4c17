// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Setup-time errors
//!
//! Lock operations never fail for transient reasons; only a broken node set
//! or an unreadable configuration is reported, and only at construction.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DsyncError {
    #[error("no lock nodes configured")]
    NoNodes,

    #[error("node endpoint #{0} is blank")]
    BlankEndpoint(usize),

    #[error("node endpoint configured twice: {0}")]
    DuplicateEndpoint(String),

    #[error("node set has {nodes} endpoints but {lockers} lockers were supplied")]
    LockerCountMismatch { nodes: usize, lockers: usize },

    #[error("locker #{index} is bound to {actual}, expected {expected}")]
    LockerEndpointMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("rpc_timeout must be greater than zero")]
    ZeroRpcTimeout,

    #[error("failed to read config {0}: {1}")]
    ReadConfig(PathBuf, #[source] std::io::Error),

    #[error("invalid config: {0}")]
    ParseConfig(#[from] toml::de::Error),
}
