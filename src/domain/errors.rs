//! Error taxonomy for the action workflow.
//!
//! Every variant is a recoverable, caller-facing condition rendered as a
//! chat reply. Guard failures never mutate state; `ReportNotFound` in
//! particular marks a stale or duplicate moderator decision and is absorbed
//! silently at the transport boundary.

use super::types::{AssetId, Handle};
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};

/// Errors that can occur while handling a workflow command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The referenced asset code does not exist.
    UnknownAsset { asset_id: AssetId },
    /// The participant is suspended and may not report actions.
    Suspended,
    /// An action was requested before selecting an asset.
    NoAssetSelected,
    /// A report for this slot, or by this participant, is already under
    /// review.
    ReviewInProgress,
    /// The action was performed too recently on this asset.
    CooldownActive {
        performed_on: NaiveDate,
        next_eligible: NaiveDate,
    },
    /// Evidence arrived without an outstanding action request.
    NoActionPending,
    /// The decision referenced a report that is no longer outstanding.
    ReportNotFound,
    /// The asset definition text could not be decoded.
    MalformedAssetDefinition { message: String },
    /// An asset with this code already exists.
    DuplicateAsset { asset_id: AssetId },
    /// No participant record exists under this handle.
    UnknownParticipant { handle: Handle },
    /// Ledger persistence failed mid-flight.
    Storage { message: String },
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAsset { asset_id } => write!(f, "unknown asset: {}", asset_id),
            Self::Suspended => write!(f, "participant is suspended"),
            Self::NoAssetSelected => write!(f, "no asset selected"),
            Self::ReviewInProgress => write!(f, "a report is already under review"),
            Self::CooldownActive { next_eligible, .. } => {
                write!(f, "cooldown active until {}", next_eligible)
            }
            Self::NoActionPending => write!(f, "no action request pending"),
            Self::ReportNotFound => write!(f, "report not found"),
            Self::MalformedAssetDefinition { message } => {
                write!(f, "malformed asset definition: {}", message)
            }
            Self::DuplicateAsset { asset_id } => write!(f, "duplicate asset: {}", asset_id),
            Self::UnknownParticipant { handle } => write!(f, "unknown participant: {}", handle),
            Self::Storage { message } => write!(f, "storage failure: {}", message),
        }
    }
}

impl std::error::Error for WorkflowError {}
