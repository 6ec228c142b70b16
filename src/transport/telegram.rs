//! Teloxide wiring: the dispatcher, keyboards, and the concrete transport.

use super::parse::{self, CallbackToken, TextCommand};
use super::{deliver, messages, ReviewCard, Transport};
use crate::config::Config;
use crate::domain::{ActionKind, Actor, AssetId, MediaRef, Verdict, WorkflowError};
use crate::engine::{EngineCommand, EngineEvent, WorkflowEngine};
use crate::report;
use crate::store::FileLedgerStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use std::sync::Arc;
use teloxide::payloads::{AnswerCallbackQuerySetters, SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup, User,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

type Engine = WorkflowEngine<FileLedgerStore>;

/// Shared dispatcher state.
pub struct App {
    engine: Mutex<Engine>,
    moderator: ChatId,
}

/// Runs the bot until the process is stopped.
pub async fn run(bot: Bot, engine: Engine, config: &Config) -> Result<()> {
    let app = Arc::new(App {
        engine: Mutex::new(engine),
        moderator: ChatId(config.moderator_id),
    });
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));
    info!("dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

/// Concrete transport over the Telegram API.
pub struct TelegramTransport {
    bot: Bot,
    moderator: ChatId,
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_to_participant(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn send_review_card(&self, card: &ReviewCard) -> Result<()> {
        self.bot
            .send_photo(
                self.moderator,
                InputFile::file_id(card.evidence.as_str().to_owned()),
            )
            .caption(messages::render_review_caption(
                &card.submitter,
                &card.asset_id,
                card.action,
            ))
            .reply_markup(decision_keyboard(&card.asset_id, card.action))
            .await?;
        Ok(())
    }
}

fn transport(bot: &Bot, app: &App) -> TelegramTransport {
    TelegramTransport {
        bot: bot.clone(),
        moderator: app.moderator,
    }
}

fn actor_from(user: &User) -> Actor {
    Actor {
        chat_id: user.id.0 as i64,
        username: user.username.clone(),
    }
}

fn entry_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(parse::BTN_CHOOSE_TREE)]])
        .resize_keyboard()
}

fn participant_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(parse::BTN_WATERED),
            KeyboardButton::new(parse::BTN_CLEANED),
        ],
        vec![
            KeyboardButton::new(parse::BTN_PROFILE),
            KeyboardButton::new(parse::BTN_LEADERBOARD),
        ],
        vec![KeyboardButton::new(parse::BTN_BACK)],
    ])
    .resize_keyboard()
}

fn moderator_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(parse::BTN_SUSPENDED),
            KeyboardButton::new(parse::BTN_ASSETS),
        ],
        vec![
            KeyboardButton::new(parse::BTN_RANKING),
            KeyboardButton::new(parse::BTN_ADD_ASSET),
        ],
        vec![
            KeyboardButton::new(parse::BTN_REPORT),
            KeyboardButton::new(parse::BTN_RESET_SCORES),
        ],
    ])
    .resize_keyboard()
}

fn decision_keyboard(asset_id: &AssetId, action: ActionKind) -> InlineKeyboardMarkup {
    let token = |verdict: Verdict| {
        parse::encode_callback(&CallbackToken::Decision {
            verdict,
            asset_id: asset_id.clone(),
            action,
        })
    };
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Approve", token(Verdict::Approve)),
        InlineKeyboardButton::callback("⚠️ Reject (warn)", token(Verdict::Warn)),
        InlineKeyboardButton::callback("⛔ Reject (block)", token(Verdict::Block)),
    ]])
}

async fn on_message(bot: Bot, msg: Message, app: Arc<App>) -> ResponseResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let actor = actor_from(&user);
    let chat = msg.chat.id;
    let is_moderator = chat == app.moderator;
    let today = Local::now().date_naive();

    if let Some(photos) = msg.photo() {
        if let Some(largest) = photos.last() {
            let evidence = MediaRef::new(largest.file.id.clone());
            submit_evidence(&bot, chat, &app, today, actor, evidence).await?;
        }
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if is_moderator && text.contains(';') {
        add_asset(&bot, chat, &app, today, text).await?;
        return Ok(());
    }

    match parse::decode_text(text) {
        Some(TextCommand::Start { deep_link }) => {
            start(&bot, chat, &app, today, actor, deep_link, is_moderator).await?;
        }
        Some(TextCommand::ChooseTree) => {
            choose_tree(&bot, chat, &app, today, actor).await?;
        }
        Some(TextCommand::SelectAsset(asset_id)) => {
            select_asset(&bot, chat, &app, today, actor, asset_id).await?;
        }
        Some(TextCommand::ReportAction(action)) => {
            request_action(&bot, chat, &app, today, actor, action).await?;
        }
        Some(TextCommand::Profile) => {
            profile(&bot, chat, &app, today, actor).await?;
        }
        Some(TextCommand::Leaderboard) => {
            leaderboard(&bot, chat, &app).await?;
        }
        Some(TextCommand::ListAssets) if is_moderator => {
            list_assets(&bot, chat, &app).await?;
        }
        Some(TextCommand::ListSuspended) if is_moderator => {
            list_suspended(&bot, chat, &app).await?;
        }
        Some(TextCommand::AddAssetPrompt) if is_moderator => {
            bot.send_message(
                chat,
                "Send: CODE;Species;Planted;Name;Role;Description;WaterDays;CleanDays",
            )
            .await?;
        }
        Some(TextCommand::ResetScores) if is_moderator => {
            reset_scores(&bot, chat, &app).await?;
        }
        Some(TextCommand::ExportReport) if is_moderator => {
            export_report(&bot, chat, &app).await?;
        }
        _ => {}
    }
    Ok(())
}

async fn start(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    actor: Actor,
    deep_link: Option<AssetId>,
    is_moderator: bool,
) -> ResponseResult<()> {
    let registered = {
        let mut engine = app.engine.lock().await;
        engine.apply(
            today,
            EngineCommand::RegisterContact {
                actor: actor.clone(),
            },
        )
    };
    if let Err(err) = registered {
        bot.send_message(chat, messages::render_error(&err)).await?;
        return Ok(());
    }
    if let Some(asset_id) = deep_link {
        return select_asset(bot, chat, app, today, actor, asset_id).await;
    }
    if is_moderator {
        bot.send_message(chat, "👋 Welcome to the moderator panel.")
            .reply_markup(moderator_keyboard())
            .await?;
    } else {
        bot.send_message(chat, "👋 Welcome! Choose a tree:")
            .reply_markup(entry_keyboard())
            .await?;
    }
    Ok(())
}

async fn choose_tree(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    actor: Actor,
) -> ResponseResult<()> {
    let result = {
        let mut engine = app.engine.lock().await;
        engine.apply(today, EngineCommand::ClearSelection { actor })
    };
    match result {
        Ok(_) => {
            bot.send_message(chat, "Send the tree code (for example ID001):")
                .reply_markup(entry_keyboard())
                .await?;
        }
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
        }
    }
    Ok(())
}

async fn select_asset(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    actor: Actor,
    asset_id: AssetId,
) -> ResponseResult<()> {
    let result = {
        let mut engine = app.engine.lock().await;
        engine.apply(today, EngineCommand::SelectAsset { actor, asset_id })
    };
    match result {
        Ok(events) => {
            for event in &events {
                if let EngineEvent::AssetSelected { asset_id, asset } = event {
                    bot.send_message(chat, messages::render_asset_card(asset_id, asset))
                        .reply_markup(participant_keyboard())
                        .await?;
                }
            }
        }
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
        }
    }
    Ok(())
}

async fn request_action(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    actor: Actor,
    action: ActionKind,
) -> ResponseResult<()> {
    let result = {
        let mut engine = app.engine.lock().await;
        engine.apply(today, EngineCommand::RequestAction { actor, action })
    };
    match result {
        Ok(_) => {
            bot.send_message(chat, "📷 Please send a photo confirming the action.")
                .await?;
        }
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
        }
    }
    Ok(())
}

async fn submit_evidence(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    actor: Actor,
    evidence: MediaRef,
) -> ResponseResult<()> {
    let result = {
        let mut engine = app.engine.lock().await;
        engine.apply(today, EngineCommand::SubmitEvidence { actor, evidence })
    };
    match result {
        Ok(events) => {
            // Ledger write is committed; forwarding to the moderator is
            // best-effort from here on.
            bot.send_message(chat, "✅ Submitted. The moderator will review it.")
                .await?;
            deliver(&transport(bot, app), &events).await;
        }
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
        }
    }
    Ok(())
}

async fn profile(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    actor: Actor,
) -> ResponseResult<()> {
    let text = {
        let mut engine = app.engine.lock().await;
        let _ = engine.apply(
            today,
            EngineCommand::RegisterContact {
                actor: actor.clone(),
            },
        );
        let handle = actor.handle();
        engine
            .participant(&handle)
            .map(|participant| messages::render_profile(&handle, participant))
    };
    if let Some(text) = text {
        bot.send_message(chat, text).await?;
    }
    Ok(())
}

async fn leaderboard(bot: &Bot, chat: ChatId, app: &Arc<App>) -> ResponseResult<()> {
    let text = {
        let engine = app.engine.lock().await;
        messages::render_leaderboard(&engine.leaderboard())
    };
    bot.send_message(chat, text).await?;
    Ok(())
}

async fn list_assets(bot: &Bot, chat: ChatId, app: &Arc<App>) -> ResponseResult<()> {
    let entries: Vec<(String, String)> = {
        let engine = app.engine.lock().await;
        engine
            .assets()
            .map(|(asset_id, asset)| {
                (
                    messages::render_asset_overview(asset_id, asset),
                    parse::encode_callback(&CallbackToken::DeleteAsset {
                        asset_id: asset_id.clone(),
                    }),
                )
            })
            .collect()
    };
    if entries.is_empty() {
        bot.send_message(chat, "No trees yet.").await?;
        return Ok(());
    }
    for (text, token) in entries {
        let keyboard =
            InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("🗑 Delete", token)]]);
        bot.send_message(chat, text).reply_markup(keyboard).await?;
    }
    Ok(())
}

async fn list_suspended(bot: &Bot, chat: ChatId, app: &Arc<App>) -> ResponseResult<()> {
    let rows: Vec<Vec<InlineKeyboardButton>> = {
        let engine = app.engine.lock().await;
        engine
            .suspended()
            .into_iter()
            .map(|handle| {
                vec![InlineKeyboardButton::callback(
                    handle.to_string(),
                    parse::encode_callback(&CallbackToken::Unsuspend {
                        handle: handle.clone(),
                    }),
                )]
            })
            .collect()
    };
    if rows.is_empty() {
        bot.send_message(chat, "🚫 No suspended users.").await?;
    } else {
        bot.send_message(chat, "🚫 Suspended users:")
            .reply_markup(InlineKeyboardMarkup::new(rows))
            .await?;
    }
    Ok(())
}

async fn add_asset(
    bot: &Bot,
    chat: ChatId,
    app: &Arc<App>,
    today: NaiveDate,
    text: &str,
) -> ResponseResult<()> {
    let definition = match parse::parse_asset_definition(text) {
        Ok(definition) => definition,
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
            return Ok(());
        }
    };
    let asset_id = definition.asset_id.clone();
    let result = {
        let mut engine = app.engine.lock().await;
        engine.apply(today, EngineCommand::AddAsset { definition })
    };
    match result {
        Ok(_) => {
            bot.send_message(chat, format!("✅ Tree {} saved.", asset_id))
                .await?;
        }
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
        }
    }
    Ok(())
}

async fn reset_scores(bot: &Bot, chat: ChatId, app: &Arc<App>) -> ResponseResult<()> {
    let result = {
        let mut engine = app.engine.lock().await;
        engine.apply(
            Local::now().date_naive(),
            EngineCommand::ResetScores { at: Utc::now() },
        )
    };
    match result {
        Ok(_) => {
            bot.send_message(chat, "✅ All scores were reset to zero.")
                .await?;
        }
        Err(err) => {
            bot.send_message(chat, messages::render_error(&err)).await?;
        }
    }
    Ok(())
}

async fn export_report(bot: &Bot, chat: ChatId, app: &Arc<App>) -> ResponseResult<()> {
    let document = {
        let engine = app.engine.lock().await;
        report::render(&*engine, Local::now())
    };
    bot.send_document(
        chat,
        InputFile::memory(document.into_bytes()).file_name("maintenance-report.txt"),
    )
    .await?;
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, app: Arc<App>) -> ResponseResult<()> {
    let from_moderator = ChatId(q.from.id.0 as i64) == app.moderator;
    let token = q.data.as_deref().and_then(parse::decode_callback);
    let mut toast: Option<String> = None;

    if let (true, Some(token)) = (from_moderator, token) {
        let today = Local::now().date_naive();
        match token {
            CallbackToken::Decision {
                verdict,
                asset_id,
                action,
            } => {
                let result = {
                    let mut engine = app.engine.lock().await;
                    engine.apply(
                        today,
                        EngineCommand::Decide {
                            verdict,
                            asset_id,
                            action,
                        },
                    )
                };
                match result {
                    Ok(events) => {
                        deliver(&transport(&bot, &app), &events).await;
                        clear_markup(&bot, &q).await?;
                    }
                    Err(WorkflowError::ReportNotFound) => {
                        // Duplicate callback delivery; the decision already
                        // landed.
                        debug!("decision callback for a resolved report");
                        clear_markup(&bot, &q).await?;
                    }
                    Err(err) => {
                        toast = Some(messages::render_error(&err));
                    }
                }
            }
            CallbackToken::DeleteAsset { asset_id } => {
                let result = {
                    let mut engine = app.engine.lock().await;
                    engine.apply(
                        today,
                        EngineCommand::DeleteAsset {
                            asset_id: asset_id.clone(),
                        },
                    )
                };
                match result {
                    Ok(events) => {
                        deliver(&transport(&bot, &app), &events).await;
                        if let Some(message) = q.regular_message() {
                            bot.edit_message_text(
                                message.chat.id,
                                message.id,
                                format!("🗑 Tree {} deleted.", asset_id),
                            )
                            .await?;
                        }
                    }
                    Err(err) => {
                        toast = Some(messages::render_error(&err));
                    }
                }
            }
            CallbackToken::Unsuspend { handle } => {
                let result = {
                    let mut engine = app.engine.lock().await;
                    engine.apply(today, EngineCommand::Unsuspend { handle })
                };
                match result {
                    Ok(_) => {
                        toast = Some("✅ Unsuspended.".to_string());
                        clear_markup(&bot, &q).await?;
                    }
                    Err(err) => {
                        toast = Some(messages::render_error(&err));
                    }
                }
            }
        }
    }

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(text) = toast {
        answer = answer.text(text).show_alert(true);
    }
    answer.await?;
    Ok(())
}

async fn clear_markup(bot: &Bot, q: &CallbackQuery) -> ResponseResult<()> {
    if let Some(message) = q.regular_message() {
        bot.edit_message_reply_markup(message.chat.id, message.id)
            .await?;
    }
    Ok(())
}
