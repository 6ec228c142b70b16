//! Ledger persistence.
//!
//! The engine is injected with store implementations rather than touching
//! files itself; full-collection rewrite on save is acceptable at the
//! expected scale.

pub mod file_store;

pub use file_store::FileLedgerStore;

use crate::domain::{Asset, AssetId, Handle, Participant};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Durable storage for the asset ledger.
pub trait AssetStore {
    fn load_assets(&self) -> Result<BTreeMap<AssetId, Asset>>;
    fn save_assets(&self, assets: &BTreeMap<AssetId, Asset>) -> Result<()>;
}

/// Durable storage for the participant ledger and the score-reset marker.
pub trait ParticipantStore {
    fn load_participants(&self) -> Result<BTreeMap<Handle, Participant>>;
    fn save_participants(&self, participants: &BTreeMap<Handle, Participant>) -> Result<()>;
    fn load_reset_marker(&self) -> Result<Option<DateTime<Utc>>>;
    fn save_reset_marker(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Bound for engines that need both ledgers.
pub trait LedgerStore: AssetStore + ParticipantStore {}

impl<T: AssetStore + ParticipantStore> LedgerStore for T {}
