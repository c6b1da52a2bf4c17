// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Randomized retry delays
//!
//! Competing coordinators that fail to reach quorum at the same moment must
//! not retry in lockstep, so every delay carries uniform random jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff with additive jitter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backoff {
    /// Delay before the first retry (before jitter)
    #[serde(with = "humantime_serde")]
    pub initial: Duration,
    /// Upper bound of the exponential part
    #[serde(with = "humantime_serde")]
    pub max: Duration,
    /// Random extra delay drawn uniformly from `[0, jitter]`
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, jitter: Duration) -> Self {
        Self {
            initial,
            max,
            jitter,
        }
    }

    /// Defaults for retrying a failed acquisition round
    pub fn acquire_default() -> Self {
        Self::new(
            Duration::from_millis(250),
            Duration::from_secs(1),
            Duration::from_millis(250),
        )
    }

    /// Defaults for retrying a release to an unreachable node
    pub fn release_default() -> Self {
        Self::new(
            Duration::from_millis(250),
            Duration::from_secs(5),
            Duration::from_millis(250),
        )
    }

    /// Deterministic part of the delay for the given retry attempt (0-based)
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max.max(self.initial))
    }

    /// Full delay for the given attempt, jitter included
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.sample_jitter()
    }

    fn sample_jitter(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::acquire_default()
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
