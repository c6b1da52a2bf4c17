// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node lock table
//!
//! Each resource is either absent (free), held exclusively by one UID, or
//! held in shared mode by a non-empty set of UIDs. There are no leases: an
//! entry stays until a matching release or an explicit force-unlock.

use crate::args::LockMode;
use crate::id::Uid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Who holds a grant and since when
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Holder {
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
}

/// State of a held resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockEntry {
    /// A single writer
    Exclusive { uid: Uid, holder: Holder },
    /// One or more readers; never empty
    Shared { readers: BTreeMap<Uid, Holder> },
}

impl LockEntry {
    pub fn mode(&self) -> LockMode {
        match self {
            LockEntry::Exclusive { .. } => LockMode::Exclusive,
            LockEntry::Shared { .. } => LockMode::Shared,
        }
    }

    /// Check if the entry includes a grant for `uid`
    pub fn is_held_by(&self, uid: &Uid) -> bool {
        match self {
            LockEntry::Exclusive { uid: current, .. } => current == uid,
            LockEntry::Shared { readers } => readers.contains_key(uid),
        }
    }
}

/// Inputs that can change a table entry
#[derive(Clone, Debug)]
pub enum LockInput {
    Lock { uid: Uid, owner: String },
    RLock { uid: Uid, owner: String },
    Unlock { uid: Uid },
    RUnlock { uid: Uid },
    /// Drop the entry whatever it holds
    ForceUnlock,
}

/// Serializable view of one held resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSnapshot {
    pub resource: String,
    pub mode: LockMode,
    pub holders: Vec<HolderSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    pub uid: Uid,
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
}

/// All entries of one node
#[derive(Clone, Debug, Default)]
pub struct LockTable {
    entries: HashMap<String, LockEntry>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for a resource, if held
    pub fn get(&self, resource: &str) -> Option<&LockEntry> {
        self.entries.get(resource)
    }

    pub fn is_free(&self, resource: &str) -> bool {
        !self.entries.contains_key(resource)
    }

    /// Number of held resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply an input to a resource entry, returning whether it took effect
    pub fn apply(&mut self, resource: &str, input: LockInput, now: DateTime<Utc>) -> bool {
        match input {
            LockInput::Lock { uid, owner } => {
                if self.entries.contains_key(resource) {
                    return false;
                }
                self.entries.insert(
                    resource.to_string(),
                    LockEntry::Exclusive {
                        uid,
                        holder: Holder {
                            owner,
                            acquired_at: now,
                        },
                    },
                );
                true
            }

            LockInput::RLock { uid, owner } => {
                let holder = Holder {
                    owner,
                    acquired_at: now,
                };
                match self.entries.get_mut(resource) {
                    None => {
                        self.entries.insert(
                            resource.to_string(),
                            LockEntry::Shared {
                                readers: BTreeMap::from([(uid, holder)]),
                            },
                        );
                        true
                    }
                    Some(LockEntry::Shared { readers }) => {
                        // Re-adding a known reader keeps its original timestamp
                        readers.entry(uid).or_insert(holder);
                        true
                    }
                    Some(LockEntry::Exclusive { .. }) => false,
                }
            }

            LockInput::Unlock { uid } => match self.entries.get(resource) {
                Some(LockEntry::Exclusive { uid: current, .. }) if *current == uid => {
                    self.entries.remove(resource);
                    true
                }
                _ => false,
            },

            LockInput::RUnlock { uid } => {
                let Some(LockEntry::Shared { readers }) = self.entries.get_mut(resource) else {
                    return false;
                };
                if readers.remove(&uid).is_none() {
                    return false;
                }
                if readers.is_empty() {
                    self.entries.remove(resource);
                }
                true
            }

            LockInput::ForceUnlock => self.entries.remove(resource).is_some(),
        }
    }

    /// Snapshot all entries, sorted by resource name
    pub fn snapshot(&self) -> Vec<LockSnapshot> {
        let mut locks: Vec<LockSnapshot> = self
            .entries
            .iter()
            .map(|(resource, entry)| LockSnapshot {
                resource: resource.clone(),
                mode: entry.mode(),
                holders: match entry {
                    LockEntry::Exclusive { uid, holder } => vec![HolderSnapshot {
                        uid: uid.clone(),
                        owner: holder.owner.clone(),
                        acquired_at: holder.acquired_at,
                    }],
                    LockEntry::Shared { readers } => readers
                        .iter()
                        .map(|(uid, holder)| HolderSnapshot {
                            uid: uid.clone(),
                            owner: holder.owner.clone(),
                            acquired_at: holder.acquired_at,
                        })
                        .collect(),
                },
            })
            .collect();
        locks.sort_by(|a, b| a.resource.cmp(&b.resource));
        locks
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
