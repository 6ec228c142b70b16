//! Structured decoding of chat input.
//!
//! All free-text interpretation lives here so the engine only ever sees
//! typed commands, and moderator decisions only ever arrive as decoded
//! tokens.

use crate::domain::{ActionKind, AssetDefinition, AssetId, Handle, Verdict, WorkflowError};

// Reply-keyboard labels. The decoder matches on them, the keyboards are
// built from them, so the two can never drift apart.
pub const BTN_CHOOSE_TREE: &str = "🌳 Choose a tree";
pub const BTN_BACK: &str = "⬅️ Back";
pub const BTN_WATERED: &str = "💧 I watered it";
pub const BTN_CLEANED: &str = "🧹 I cleaned it";
pub const BTN_PROFILE: &str = "👤 My profile";
pub const BTN_LEADERBOARD: &str = "🏆 Leaderboard";
pub const BTN_ASSETS: &str = "🌳 Trees";
pub const BTN_SUSPENDED: &str = "🚫 Suspended users";
pub const BTN_RANKING: &str = "🏆 User ranking";
pub const BTN_ADD_ASSET: &str = "➕ Add tree";
pub const BTN_REPORT: &str = "📄 Report";
pub const BTN_RESET_SCORES: &str = "♻️ Reset scores";

/// A decoded text message.
///
/// Moderator-only items are still decoded for everyone; the dispatcher
/// drops them unless the sender is the moderator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextCommand {
    Start { deep_link: Option<AssetId> },
    ChooseTree,
    SelectAsset(AssetId),
    ReportAction(ActionKind),
    Profile,
    Leaderboard,
    ListAssets,
    ListSuspended,
    AddAssetPrompt,
    ResetScores,
    ExportReport,
}

pub fn decode_text(text: &str) -> Option<TextCommand> {
    let text = text.trim();
    if let Some(payload) = text.strip_prefix("/start") {
        let payload = payload.trim();
        let deep_link = (!payload.is_empty()).then(|| AssetId::new(payload));
        return Some(TextCommand::Start { deep_link });
    }
    match text {
        BTN_CHOOSE_TREE | BTN_BACK => return Some(TextCommand::ChooseTree),
        BTN_WATERED => return Some(TextCommand::ReportAction(ActionKind::Water)),
        BTN_CLEANED => return Some(TextCommand::ReportAction(ActionKind::Clean)),
        BTN_PROFILE => return Some(TextCommand::Profile),
        BTN_LEADERBOARD | BTN_RANKING => return Some(TextCommand::Leaderboard),
        BTN_ASSETS => return Some(TextCommand::ListAssets),
        BTN_SUSPENDED => return Some(TextCommand::ListSuspended),
        BTN_ADD_ASSET => return Some(TextCommand::AddAssetPrompt),
        BTN_RESET_SCORES => return Some(TextCommand::ResetScores),
        BTN_REPORT => return Some(TextCommand::ExportReport),
        _ => {}
    }
    if looks_like_asset_code(text) {
        return Some(TextCommand::SelectAsset(AssetId::new(text)));
    }
    None
}

/// Bare asset codes look like `ID001`; anything with separators or spaces
/// is not a code.
fn looks_like_asset_code(text: &str) -> bool {
    text.len() > 2
        && text.to_uppercase().starts_with("ID")
        && !text.contains(';')
        && !text.contains(char::is_whitespace)
}

/// Decodes `CODE;Species;Planted;Name;Role;Description;WaterDays;CleanDays`.
pub fn parse_asset_definition(text: &str) -> Result<AssetDefinition, WorkflowError> {
    let fields: Vec<&str> = text.split(';').map(str::trim).collect();
    let [id, species, planted_on, name, role, description, water, clean] = fields.as_slice()
    else {
        return Err(malformed("expected 8 fields separated by ';'"));
    };
    if id.is_empty() {
        return Err(malformed("asset code is empty"));
    }
    Ok(AssetDefinition {
        asset_id: AssetId::new(id),
        species: (*species).to_string(),
        planted_on: (*planted_on).to_string(),
        planter: format!("{} ({})", name, role),
        description: (*description).to_string(),
        water_interval_days: parse_interval(water)?,
        clean_interval_days: parse_interval(clean)?,
    })
}

fn parse_interval(raw: &str) -> Result<u32, WorkflowError> {
    match raw.parse::<u32>() {
        Ok(days) if days >= 1 => Ok(days),
        _ => Err(malformed(&format!(
            "interval '{}' must be a whole number of days, at least 1",
            raw
        ))),
    }
}

fn malformed(message: &str) -> WorkflowError {
    WorkflowError::MalformedAssetDefinition {
        message: message.to_string(),
    }
}

/// Inline-button payloads, structured at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackToken {
    Decision {
        verdict: Verdict,
        asset_id: AssetId,
        action: ActionKind,
    },
    Unsuspend {
        handle: Handle,
    },
    DeleteAsset {
        asset_id: AssetId,
    },
}

pub fn encode_callback(token: &CallbackToken) -> String {
    match token {
        CallbackToken::Decision {
            verdict,
            asset_id,
            action,
        } => format!("{}:{}:{}", verdict.as_str(), asset_id, action),
        CallbackToken::Unsuspend { handle } => format!("unsuspend:{}", handle),
        CallbackToken::DeleteAsset { asset_id } => format!("delete:{}", asset_id),
    }
}

pub fn decode_callback(data: &str) -> Option<CallbackToken> {
    let (kind, rest) = data.split_once(':')?;
    match kind {
        "unsuspend" => Some(CallbackToken::Unsuspend {
            handle: Handle::new(rest),
        }),
        "delete" => Some(CallbackToken::DeleteAsset {
            asset_id: AssetId::new(rest),
        }),
        _ => {
            let verdict = Verdict::parse(kind)?;
            let (asset_id, action) = rest.split_once(':')?;
            Some(CallbackToken::Decision {
                verdict,
                asset_id: AssetId::new(asset_id),
                action: ActionKind::parse(action)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_deep_link_selects_the_asset() {
        assert_eq!(
            decode_text("/start id001"),
            Some(TextCommand::Start {
                deep_link: Some(AssetId::new("ID001"))
            })
        );
        assert_eq!(
            decode_text("/start"),
            Some(TextCommand::Start { deep_link: None })
        );
    }

    #[test]
    fn bare_codes_decode_as_selection() {
        assert_eq!(
            decode_text("id001"),
            Some(TextCommand::SelectAsset(AssetId::new("ID001")))
        );
        assert_eq!(decode_text("ID"), None);
        assert_eq!(decode_text("ID001 extra"), None);
        assert_eq!(decode_text("hello"), None);
    }

    #[test]
    fn button_labels_decode() {
        assert_eq!(
            decode_text(BTN_WATERED),
            Some(TextCommand::ReportAction(ActionKind::Water))
        );
        assert_eq!(
            decode_text(BTN_CLEANED),
            Some(TextCommand::ReportAction(ActionKind::Clean))
        );
        assert_eq!(decode_text(BTN_BACK), Some(TextCommand::ChooseTree));
        assert_eq!(decode_text(BTN_RANKING), Some(TextCommand::Leaderboard));
        assert_eq!(decode_text(BTN_RESET_SCORES), Some(TextCommand::ResetScores));
    }

    #[test]
    fn asset_definition_parses_and_normalizes() {
        let definition =
            parse_asset_definition("id007;Maple;2025-05-01;Karim;gardener;Park row;3;14")
                .expect("valid definition");
        assert_eq!(definition.asset_id, AssetId::new("ID007"));
        assert_eq!(definition.planter, "Karim (gardener)");
        assert_eq!(definition.water_interval_days, 3);
        assert_eq!(definition.clean_interval_days, 14);
    }

    #[test]
    fn asset_definition_rejects_bad_input() {
        assert!(matches!(
            parse_asset_definition("ID007;Maple;2025-05-01"),
            Err(WorkflowError::MalformedAssetDefinition { .. })
        ));
        assert!(matches!(
            parse_asset_definition("ID007;Maple;2025-05-01;Karim;gardener;Park row;zero;14"),
            Err(WorkflowError::MalformedAssetDefinition { .. })
        ));
        assert!(matches!(
            parse_asset_definition("ID007;Maple;2025-05-01;Karim;gardener;Park row;0;14"),
            Err(WorkflowError::MalformedAssetDefinition { .. })
        ));
    }

    #[test]
    fn callback_tokens_round_trip() {
        let tokens = [
            CallbackToken::Decision {
                verdict: Verdict::Approve,
                asset_id: AssetId::new("ID001"),
                action: ActionKind::Water,
            },
            CallbackToken::Decision {
                verdict: Verdict::Block,
                asset_id: AssetId::new("ID002"),
                action: ActionKind::Clean,
            },
            CallbackToken::Unsuspend {
                handle: Handle::new("some_user"),
            },
            CallbackToken::DeleteAsset {
                asset_id: AssetId::new("ID001"),
            },
        ];
        for token in tokens {
            assert_eq!(decode_callback(&encode_callback(&token)), Some(token));
        }
    }

    #[test]
    fn unknown_callback_data_decodes_to_none() {
        assert_eq!(decode_callback("nonsense"), None);
        assert_eq!(decode_callback("approve:ID001"), None);
        assert_eq!(decode_callback("promote:ID001:water"), None);
        assert_eq!(decode_callback("approve:ID001:prune"), None);
    }

    #[test]
    fn underscored_handles_survive_the_codec() {
        let token = CallbackToken::Unsuspend {
            handle: Handle::new("user_with_underscores"),
        };
        assert_eq!(decode_callback(&encode_callback(&token)), Some(token));
    }
}
