//! JSON file persistence for the maintenance ledgers.
//!
//! Each collection is serialized as a mapping from identifier to record and
//! rewritten wholesale on save. Writes go through a temp file plus rename so
//! a crash mid-write never leaves a truncated ledger behind. Missing files
//! load as empty collections (first run); unreadable files are errors.

use super::{AssetStore, ParticipantStore};
use crate::domain::{Asset, AssetId, Handle, Participant};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

const ASSETS_FILE: &str = "assets.json";
const PARTICIPANTS_FILE: &str = "participants.json";
const RESET_MARKER_FILE: &str = "score_reset.json";

/// File-backed store keeping all ledgers under one data directory.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    dir: PathBuf,
}

impl FileLedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn write_atomic<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create directory {}", self.dir.display()))?;
        let path = self.dir.join(name);
        let content =
            serde_json::to_string_pretty(value).context("failed to serialize ledger to JSON")?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("failed to write temp file {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("failed to rename temp file to {}", path.display()))?;
        Ok(())
    }
}

impl AssetStore for FileLedgerStore {
    fn load_assets(&self) -> Result<BTreeMap<AssetId, Asset>> {
        self.read_or_default(ASSETS_FILE)
    }

    fn save_assets(&self, assets: &BTreeMap<AssetId, Asset>) -> Result<()> {
        self.write_atomic(ASSETS_FILE, assets)
    }
}

impl ParticipantStore for FileLedgerStore {
    fn load_participants(&self) -> Result<BTreeMap<Handle, Participant>> {
        self.read_or_default(PARTICIPANTS_FILE)
    }

    fn save_participants(&self, participants: &BTreeMap<Handle, Participant>) -> Result<()> {
        self.write_atomic(PARTICIPANTS_FILE, participants)
    }

    fn load_reset_marker(&self) -> Result<Option<DateTime<Utc>>> {
        self.read_or_default(RESET_MARKER_FILE)
    }

    fn save_reset_marker(&self, at: DateTime<Utc>) -> Result<()> {
        self.write_atomic(RESET_MARKER_FILE, &at)
    }
}
