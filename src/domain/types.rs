//! Strongly typed domain primitives and ledger records.
//!
//! Identifiers are newtypes so an asset code can never be confused with a
//! participant handle or a media reference, and the ledger records carry
//! their own small mutation helpers so counter updates stay in one place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the two maintenance operations tracked per asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Water,
    Clean,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Clean => "clean",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "water" => Some(Self::Water),
            "clean" => Some(Self::Clean),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderator verdict on an outstanding report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Warn,
    Block,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Warn => "warn",
            Self::Block => "block",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(Self::Approve),
            "warn" => Some(Self::Warn),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// Human-assigned asset code. Case-insensitive on input, stored uppercase.
/// Once created the code is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant key: the chat username, or the decimal chat id for accounts
/// without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a piece of photographic evidence held by the chat
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The identity behind an inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub chat_id: i64,
    pub username: Option<String>,
}

impl Actor {
    /// Ledger key for this actor.
    pub fn handle(&self) -> Handle {
        match &self.username {
            Some(username) => Handle::new(username.clone()),
            None => Handle::new(self.chat_id.to_string()),
        }
    }
}

/// Durable record of one maintenance asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub species: String,
    pub description: String,
    pub planted_on: String,
    pub planter: String,
    pub water_interval_days: u32,
    pub clean_interval_days: u32,
    #[serde(default)]
    pub last_water: Option<NaiveDate>,
    #[serde(default)]
    pub last_clean: Option<NaiveDate>,
    #[serde(default)]
    pub water_count: u32,
    #[serde(default)]
    pub clean_count: u32,
}

impl Asset {
    pub fn interval_days(&self, action: ActionKind) -> u32 {
        match action {
            ActionKind::Water => self.water_interval_days,
            ActionKind::Clean => self.clean_interval_days,
        }
    }

    pub fn last_performed(&self, action: ActionKind) -> Option<NaiveDate> {
        match action {
            ActionKind::Water => self.last_water,
            ActionKind::Clean => self.last_clean,
        }
    }

    /// Stamps an approved performance: last-performed date and counter.
    pub fn record_approval(&mut self, action: ActionKind, on: NaiveDate) {
        match action {
            ActionKind::Water => {
                self.last_water = Some(on);
                self.water_count += 1;
            }
            ActionKind::Clean => {
                self.last_clean = Some(on);
                self.clean_count += 1;
            }
        }
    }
}

/// A validated asset definition as entered by the moderator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefinition {
    pub asset_id: AssetId,
    pub species: String,
    pub planted_on: String,
    pub planter: String,
    pub description: String,
    pub water_interval_days: u32,
    pub clean_interval_days: u32,
}

impl AssetDefinition {
    pub fn into_asset(self) -> (AssetId, Asset) {
        let asset = Asset {
            species: self.species,
            description: self.description,
            planted_on: self.planted_on,
            planter: self.planter,
            water_interval_days: self.water_interval_days,
            clean_interval_days: self.clean_interval_days,
            last_water: None,
            last_clean: None,
            water_count: 0,
            clean_count: 0,
        };
        (self.asset_id, asset)
    }
}

/// An action request that has passed its guards but not yet received
/// evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub asset_id: AssetId,
    pub action: ActionKind,
}

/// Durable record of one participant. Created lazily on first contact,
/// never deleted; suspension is a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub chat_id: i64,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub warnings: u32,
    #[serde(default)]
    pub water_done: u32,
    #[serde(default)]
    pub clean_done: u32,
    #[serde(default)]
    pub selected_asset: Option<AssetId>,
    #[serde(default)]
    pub pending_request: Option<PendingRequest>,
}

impl Participant {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            score: 0,
            suspended: false,
            warnings: 0,
            water_done: 0,
            clean_done: 0,
            selected_asset: None,
            pending_request: None,
        }
    }

    /// Credits an approved report: per-action counter and score.
    pub fn record_approval(&mut self, action: ActionKind, reward: u32) {
        match action {
            ActionKind::Water => self.water_done += 1,
            ActionKind::Clean => self.clean_done += 1,
        }
        self.score += reward;
    }
}
