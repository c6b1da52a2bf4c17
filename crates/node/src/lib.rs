// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dsync-node: the `lockd` lock node and its TCP client

pub mod client;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use client::RemoteLocker;
pub use lifecycle::{startup, LifecycleError, NodeConfig, NodeState};
pub use protocol::{ProtocolError, Request, Response};
pub use server::{serve, ServerState};
