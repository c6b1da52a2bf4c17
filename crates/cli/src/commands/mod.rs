// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod force_unlock;
pub mod hold;
pub mod run;
pub mod status;

use dsync_core::LockMode;

/// Mode selected by the `--shared` flag
pub fn mode(shared: bool) -> LockMode {
    if shared {
        LockMode::Shared
    } else {
        LockMode::Exclusive
    }
}
