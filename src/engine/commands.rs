//! Commands accepted by the workflow engine.

use crate::domain::{ActionKind, Actor, AssetDefinition, AssetId, Handle, MediaRef, Verdict};
use chrono::{DateTime, Utc};

/// Structured inputs to the engine's `apply` method.
///
/// Produced by the transport decoder; the engine never parses raw text.
/// Moderator-only commands are gated by chat identity at the transport
/// boundary, before they are ever constructed.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Ensures a participant record exists for the actor.
    RegisterContact { actor: Actor },
    /// Points the actor's session at an asset.
    SelectAsset { actor: Actor, asset_id: AssetId },
    /// Drops the actor's selection and any stale action request.
    ClearSelection { actor: Actor },
    /// Opens an action request for the selected asset.
    RequestAction { actor: Actor, action: ActionKind },
    /// Supplies evidence for the outstanding request.
    SubmitEvidence { actor: Actor, evidence: MediaRef },
    /// Moderator decision on an outstanding report.
    Decide {
        verdict: Verdict,
        asset_id: AssetId,
        action: ActionKind,
    },
    /// Creates a new asset record.
    AddAsset { definition: AssetDefinition },
    /// Removes an asset record, discarding any outstanding reports for it.
    DeleteAsset { asset_id: AssetId },
    /// Clears a participant's suspension flag.
    Unsuspend { handle: Handle },
    /// Zeroes every participant's score and per-action counters.
    ResetScores { at: DateTime<Utc> },
}
