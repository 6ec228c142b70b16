//! User-facing message rendering.

use crate::domain::{ActionKind, Asset, AssetId, Handle, Participant, WorkflowError};
use chrono::NaiveDate;
use std::fmt::Write as _;

pub fn action_label(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Water => "watering",
        ActionKind::Clean => "cleaning",
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn fmt_last(last: Option<NaiveDate>) -> String {
    match last {
        Some(date) => fmt_date(date),
        None => "never".to_string(),
    }
}

pub fn render_error(error: &WorkflowError) -> String {
    match error {
        WorkflowError::UnknownAsset { asset_id } => {
            format!("❌ No tree with code {} was found.", asset_id)
        }
        WorkflowError::Suspended => "⛔ You are suspended and cannot report actions.".to_string(),
        WorkflowError::NoAssetSelected => "❗ Choose a tree first.".to_string(),
        WorkflowError::ReviewInProgress => {
            "⏳ A report for this action is already being reviewed by the moderator.".to_string()
        }
        WorkflowError::CooldownActive {
            performed_on,
            next_eligible,
        } => format!(
            "ℹ️ This was last done on {}.\nNext eligible date: {}.",
            fmt_date(*performed_on),
            fmt_date(*next_eligible)
        ),
        WorkflowError::NoActionPending => "❗ Pick an action before sending a photo.".to_string(),
        WorkflowError::ReportNotFound => "Report not found.".to_string(),
        WorkflowError::MalformedAssetDefinition { message } => {
            format!("❌ Could not read the tree definition: {}.", message)
        }
        WorkflowError::DuplicateAsset { asset_id } => {
            format!("❗ Tree {} already exists.", asset_id)
        }
        WorkflowError::UnknownParticipant { handle } => {
            format!("❗ No user {} on record.", handle)
        }
        WorkflowError::Storage { .. } => {
            "⚠️ Something went wrong saving your action. Please try again.".to_string()
        }
    }
}

/// Full asset card shown when a participant selects a tree.
pub fn render_asset_card(asset_id: &AssetId, asset: &Asset) -> String {
    format!(
        "🌳 {} ({})\n{}\nPlanted: {}\nPlanted by: {}\nWater every {} days, clean every {} days\nLast watered: {}\nLast cleaned: {}",
        asset.species,
        asset_id,
        asset.description,
        asset.planted_on,
        asset.planter,
        asset.water_interval_days,
        asset.clean_interval_days,
        fmt_last(asset.last_water),
        fmt_last(asset.last_clean),
    )
}

/// Compact per-asset line for the moderator's overview.
pub fn render_asset_overview(asset_id: &AssetId, asset: &Asset) -> String {
    format!(
        "{}: {}\nWatered: {} ({} times)\nCleaned: {} ({} times)",
        asset_id,
        asset.species,
        fmt_last(asset.last_water),
        asset.water_count,
        fmt_last(asset.last_clean),
        asset.clean_count,
    )
}

pub fn render_profile(handle: &Handle, participant: &Participant) -> String {
    format!(
        "👤 @{}\n🎯 Score: {}\n💧 Watered: {} times\n🧹 Cleaned: {} times",
        handle, participant.score, participant.water_done, participant.clean_done
    )
}

pub fn render_leaderboard(rows: &[(&Handle, &Participant)]) -> String {
    if rows.is_empty() {
        return "🏆 No participants yet.".to_string();
    }
    let mut out = String::from("🏆 Leaderboard:\n");
    for (rank, (handle, participant)) in rows.iter().enumerate() {
        let _ = writeln!(out, "{}. @{} - {} points", rank + 1, handle, participant.score);
    }
    out
}

/// Caption for the review card forwarded to the moderator.
pub fn render_review_caption(submitter: &Handle, asset_id: &AssetId, action: ActionKind) -> String {
    format!("👤 @{}\n🌳 {}\n🔧 {}", submitter, asset_id, action_label(action))
}

pub fn render_approved(action: ActionKind, reward: u32) -> String {
    format!(
        "✅ Your {} report was approved. +{} points.",
        action_label(action),
        reward
    )
}

pub fn render_warned() -> String {
    "⚠️ Your report was rejected and a warning was recorded. Another rejection may get you suspended.".to_string()
}

pub fn render_blocked() -> String {
    "⛔ Your report was rejected. You are suspended and can no longer report actions.".to_string()
}

pub fn render_orphaned(asset_id: &AssetId, action: ActionKind) -> String {
    format!(
        "ℹ️ Tree {} was removed; your {} report was discarded.",
        asset_id,
        action_label(action)
    )
}
