// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed reader-writer mutex handle

use super::{Dsync, Grant};
use crate::args::LockMode;
use crate::id::{UidGen, UuidGen};
use std::collections::VecDeque;

/// Client-side handle for one named resource
///
/// Holds at most one exclusive grant, or any number of shared grants taken
/// through this handle. Calls are not reentrant: locking a handle that already
/// holds an exclusive grant blocks until that grant is gone from a quorum,
/// which in practice is forever.
pub struct DRWMutex<G: UidGen = UuidGen> {
    resource: String,
    dsync: Dsync<G>,
    writer: Option<Grant>,
    readers: VecDeque<Grant>,
}

impl<G: UidGen> DRWMutex<G> {
    pub(super) fn new(resource: String, dsync: Dsync<G>) -> Self {
        Self {
            resource,
            dsync,
            writer: None,
            readers: VecDeque::new(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Block until an exclusive grant is held by a quorum of nodes
    pub async fn lock(&mut self) {
        if self.writer.is_some() {
            tracing::warn!(resource = %self.resource, "lock called on a handle that already holds it");
        }
        let grant = self.dsync.acquire(LockMode::Exclusive, &self.resource).await;
        self.writer = Some(grant);
    }

    /// Block until a shared grant is held by a quorum of nodes
    pub async fn rlock(&mut self) {
        let grant = self.dsync.acquire(LockMode::Shared, &self.resource).await;
        self.readers.push_back(grant);
    }

    /// Release the exclusive grant; a no-op when none is held
    ///
    /// Returns once the release is dispatched to every node that granted it.
    /// Use [`Dsync::flush_releases`] to wait for the nodes' answers.
    pub async fn unlock(&mut self) {
        match self.writer.take() {
            Some(grant) => self.dsync.release(grant),
            None => {
                tracing::warn!(resource = %self.resource, "unlock called without an exclusive grant")
            }
        }
    }

    /// Release the oldest shared grant; a no-op when none is held
    pub async fn runlock(&mut self) {
        match self.readers.pop_front() {
            Some(grant) => self.dsync.release(grant),
            None => {
                tracing::warn!(resource = %self.resource, "runlock called without a shared grant")
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.writer.is_some()
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// The current exclusive grant, if any
    pub fn exclusive_grant(&self) -> Option<&Grant> {
        self.writer.as_ref()
    }

    /// Shared grants, oldest first
    pub fn shared_grants(&self) -> impl Iterator<Item = &Grant> {
        self.readers.iter()
    }
}

impl<G: UidGen> Drop for DRWMutex<G> {
    fn drop(&mut self) {
        if self.writer.is_some() || !self.readers.is_empty() {
            tracing::warn!(
                resource = %self.resource,
                exclusive = self.writer.is_some(),
                shared = self.readers.len(),
                "handle dropped while holding grants, node entries remain"
            );
        }
    }
}

impl<G: UidGen> std::fmt::Debug for DRWMutex<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DRWMutex")
            .field("resource", &self.resource)
            .field("writer", &self.writer)
            .field("readers", &self.readers)
            .finish()
    }
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
