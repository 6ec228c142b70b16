//! Single-flight review gate.
//!
//! At most one outstanding report exists per (asset, action) key; the
//! existence of an entry is itself the concurrency lock. Admit and resolve
//! are the only mutators, which keeps the single-flight invariant
//! mechanically checkable.

use crate::domain::{ActionKind, AssetId, Handle, MediaRef};
use chrono::NaiveDate;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Key identifying one reviewable slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewKey {
    pub asset_id: AssetId,
    pub action: ActionKind,
}

/// An evidence submission awaiting the moderator's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub submitter: Handle,
    pub submitted_on: NaiveDate,
    pub evidence: MediaRef,
}

/// Admission was refused because the slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyPending;

/// In-memory registry of outstanding reports.
#[derive(Debug, Default)]
pub struct ReviewGate {
    entries: HashMap<ReviewKey, ReviewEntry>,
}

impl ReviewGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry if and only if the slot is free. Never overwrites
    /// an existing entry.
    pub fn try_admit(&mut self, key: ReviewKey, entry: ReviewEntry) -> Result<(), AlreadyPending> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(AlreadyPending),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Removes and returns the entry for `key`, if any.
    pub fn resolve(&mut self, key: &ReviewKey) -> Option<ReviewEntry> {
        self.entries.remove(key)
    }

    /// Non-mutating lookup.
    pub fn peek(&self, key: &ReviewKey) -> Option<&ReviewEntry> {
        self.entries.get(key)
    }

    /// Removes every entry keyed to `asset_id`, returning the orphans.
    pub fn clear_asset(&mut self, asset_id: &AssetId) -> Vec<(ReviewKey, ReviewEntry)> {
        let mut orphaned = Vec::new();
        self.entries.retain(|key, entry| {
            if key.asset_id == *asset_id {
                orphaned.push((key.clone(), entry.clone()));
                false
            } else {
                true
            }
        });
        orphaned
    }

    /// Whether any outstanding entry was submitted by `handle`.
    pub fn has_pending_from(&self, handle: &Handle) -> bool {
        self.entries.values().any(|entry| entry.submitter == *handle)
    }
}
