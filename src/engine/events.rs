//! Events emitted by the workflow engine.
//!
//! Events carry owned snapshots of whatever the transport needs to render
//! notifications. By the time an event is returned, the corresponding
//! ledger write has already been flushed; delivery is best-effort and never
//! rolls the write back.

use crate::domain::{ActionKind, Asset, AssetId, Handle, MediaRef};
use chrono::{DateTime, NaiveDate, Utc};

/// A party to notify, resolved from the participant ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    pub handle: Handle,
    pub chat_id: i64,
}

/// A report discarded because its asset was deleted mid-review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedReport {
    pub action: ActionKind,
    pub participant: NotifyTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ParticipantRegistered {
        handle: Handle,
    },
    AssetSelected {
        asset_id: AssetId,
        asset: Asset,
    },
    SelectionCleared,
    EvidenceRequested {
        asset_id: AssetId,
        action: ActionKind,
    },
    ReviewOpened {
        asset_id: AssetId,
        action: ActionKind,
        submitter: Handle,
        submitted_on: NaiveDate,
        evidence: MediaRef,
    },
    ReviewApproved {
        asset_id: AssetId,
        action: ActionKind,
        participant: NotifyTarget,
        reward: u32,
    },
    ReviewWarned {
        participant: NotifyTarget,
        warnings: u32,
    },
    ReviewBlocked {
        participant: NotifyTarget,
    },
    AssetAdded {
        asset_id: AssetId,
    },
    AssetDeleted {
        asset_id: AssetId,
        orphaned: Vec<OrphanedReport>,
    },
    ParticipantUnsuspended {
        handle: Handle,
    },
    ScoresReset {
        at: DateTime<Utc>,
        participants: usize,
    },
}
