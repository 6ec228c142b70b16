//! Chat transport adapter.
//!
//! The engine emits events; `deliver` turns them into outbound sends
//! through the [`Transport`] trait. Participant notifications are
//! best-effort: a delivery failure (for example a participant who blocked
//! the bot) is logged and swallowed, never undoing the ledger write that
//! preceded it.

pub mod messages;
pub mod parse;
pub mod telegram;

use crate::domain::{ActionKind, AssetId, Handle, MediaRef};
use crate::engine::{EngineEvent, NotifyTarget};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, warn};

/// Review card forwarded to the moderator when evidence is admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCard {
    pub asset_id: AssetId,
    pub action: ActionKind,
    pub submitter: Handle,
    pub evidence: MediaRef,
}

/// Outbound chat operations the engine's events need.
#[async_trait]
pub trait Transport {
    async fn send_to_participant(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_review_card(&self, card: &ReviewCard) -> Result<()>;
}

/// Fans engine events out to the transport.
pub async fn deliver<T: Transport>(transport: &T, events: &[EngineEvent]) {
    for event in events {
        match event {
            EngineEvent::ReviewOpened {
                asset_id,
                action,
                submitter,
                evidence,
                ..
            } => {
                let card = ReviewCard {
                    asset_id: asset_id.clone(),
                    action: *action,
                    submitter: submitter.clone(),
                    evidence: evidence.clone(),
                };
                if let Err(err) = transport.send_review_card(&card).await {
                    error!(asset = %asset_id, ?err, "failed to forward review card to moderator");
                }
            }
            EngineEvent::ReviewApproved {
                action,
                participant,
                reward,
                ..
            } => {
                notify(
                    transport,
                    participant,
                    &messages::render_approved(*action, *reward),
                )
                .await;
            }
            EngineEvent::ReviewWarned { participant, .. } => {
                notify(transport, participant, &messages::render_warned()).await;
            }
            EngineEvent::ReviewBlocked { participant } => {
                notify(transport, participant, &messages::render_blocked()).await;
            }
            EngineEvent::AssetDeleted { asset_id, orphaned } => {
                for orphan in orphaned {
                    notify(
                        transport,
                        &orphan.participant,
                        &messages::render_orphaned(asset_id, orphan.action),
                    )
                    .await;
                }
            }
            _ => {}
        }
    }
}

async fn notify<T: Transport>(transport: &T, target: &NotifyTarget, text: &str) {
    if let Err(err) = transport.send_to_participant(target.chat_id, text).await {
        warn!(participant = %target.handle, ?err, "participant notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(i64, String)>>,
        cards: Mutex<Vec<ReviewCard>>,
        fail_sends: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send_to_participant(&self, chat_id: i64, text: &str) -> Result<()> {
            if self.fail_sends {
                return Err(anyhow!("blocked by participant"));
            }
            self.sent
                .lock()
                .expect("lock")
                .push((chat_id, text.to_string()));
            Ok(())
        }

        async fn send_review_card(&self, card: &ReviewCard) -> Result<()> {
            self.cards.lock().expect("lock").push(card.clone());
            Ok(())
        }
    }

    fn target() -> NotifyTarget {
        NotifyTarget {
            handle: Handle::new("alice"),
            chat_id: 100,
        }
    }

    #[tokio::test]
    async fn review_opened_reaches_the_moderator() {
        let transport = RecordingTransport::default();
        let events = vec![EngineEvent::ReviewOpened {
            asset_id: AssetId::new("ID001"),
            action: ActionKind::Water,
            submitter: Handle::new("alice"),
            submitted_on: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            evidence: MediaRef::new("photo-1"),
        }];

        deliver(&transport, &events).await;

        let cards = transport.cards.lock().expect("lock");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].submitter, Handle::new("alice"));
    }

    #[tokio::test]
    async fn decision_events_notify_the_submitter() {
        let transport = RecordingTransport::default();
        let events = vec![
            EngineEvent::ReviewApproved {
                asset_id: AssetId::new("ID001"),
                action: ActionKind::Water,
                participant: target(),
                reward: 10,
            },
            EngineEvent::ReviewWarned {
                participant: target(),
                warnings: 1,
            },
            EngineEvent::ReviewBlocked {
                participant: target(),
            },
        ];

        deliver(&transport, &events).await;

        let sent = transport.sent.lock().expect("lock");
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|(chat_id, _)| *chat_id == 100));
        assert!(sent[0].1.contains("+10 points"));
    }

    #[tokio::test]
    async fn failed_participant_sends_are_swallowed() {
        let transport = RecordingTransport {
            fail_sends: true,
            ..Default::default()
        };
        let events = vec![EngineEvent::ReviewApproved {
            asset_id: AssetId::new("ID001"),
            action: ActionKind::Water,
            participant: target(),
            reward: 10,
        }];

        // Must not panic or propagate; the ledger write already happened.
        deliver(&transport, &events).await;
        assert!(transport.sent.lock().expect("lock").is_empty());
    }
}
