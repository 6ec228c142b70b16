//! Plain-text report export for the moderator.

use crate::engine::WorkflowEngine;
use chrono::{DateTime, Local};
use std::fmt::Write as _;

/// Renders the maintenance report document: generation time, last score
/// reset, and per-asset plus per-participant statistics.
pub fn render<S>(engine: &WorkflowEngine<S>, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Community Tree Maintenance Report");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%d.%m.%Y %H:%M"));
    match engine.last_reset() {
        Some(at) => {
            let _ = writeln!(
                out,
                "Scores last reset: {}",
                at.with_timezone(&Local).format("%d.%m.%Y %H:%M")
            );
        }
        None => {
            let _ = writeln!(out, "Scores last reset: never");
        }
    }

    let _ = writeln!(out, "\nTrees");
    for (asset_id, asset) in engine.assets() {
        let _ = writeln!(
            out,
            "{} - {} | watered {} times | cleaned {} times",
            asset_id, asset.species, asset.water_count, asset.clean_count
        );
    }

    let _ = writeln!(out, "\nParticipants");
    for (handle, participant) in engine.participants() {
        let _ = writeln!(
            out,
            "{} | score {} | watered {} | cleaned {}",
            handle, participant.score, participant.water_done, participant.clean_done
        );
    }
    out
}
