//! Action workflow engine.
//!
//! This module is the ONLY place ledger and gate mutations happen. The
//! engine owns the in-memory ledgers, validates each command fail-closed,
//! applies the mutation, flushes the affected ledger through the injected
//! store, and returns events for the transport to deliver. Notification
//! delivery is best-effort and never rolls back a committed write.

mod commands;
pub mod cooldown;
mod events;
mod gate;

pub use commands::EngineCommand;
pub use events::{EngineEvent, NotifyTarget, OrphanedReport};
pub use gate::{AlreadyPending, ReviewEntry, ReviewGate, ReviewKey};

use crate::domain::{
    ActionKind, Actor, Asset, AssetDefinition, AssetId, Handle, MediaRef, Participant,
    PendingRequest, Verdict, WorkflowError,
};
use crate::store::LedgerStore;
use chrono::{DateTime, NaiveDate, Utc};
use cooldown::Cooldown;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Points granted to the submitter when a report is approved.
pub const APPROVAL_REWARD: u32 = 10;

/// Owns the ledgers and the single-flight review gate; serializes all
/// mutations behind `apply`.
pub struct WorkflowEngine<S> {
    assets: BTreeMap<AssetId, Asset>,
    participants: BTreeMap<Handle, Participant>,
    gate: ReviewGate,
    store: S,
    last_reset: Option<DateTime<Utc>>,
}

impl<S> WorkflowEngine<S> {
    pub fn asset(&self, asset_id: &AssetId) -> Option<&Asset> {
        self.assets.get(asset_id)
    }

    pub fn assets(&self) -> impl Iterator<Item = (&AssetId, &Asset)> {
        self.assets.iter()
    }

    pub fn participant(&self, handle: &Handle) -> Option<&Participant> {
        self.participants.get(handle)
    }

    pub fn participants(&self) -> impl Iterator<Item = (&Handle, &Participant)> {
        self.participants.iter()
    }

    /// All participants, highest score first.
    pub fn leaderboard(&self) -> Vec<(&Handle, &Participant)> {
        let mut rows: Vec<_> = self.participants.iter().collect();
        rows.sort_by(|a, b| b.1.score.cmp(&a.1.score));
        rows
    }

    pub fn suspended(&self) -> Vec<&Handle> {
        self.participants
            .iter()
            .filter(|(_, participant)| participant.suspended)
            .map(|(handle, _)| handle)
            .collect()
    }

    pub fn last_reset(&self) -> Option<DateTime<Utc>> {
        self.last_reset
    }
}

impl<S: LedgerStore> WorkflowEngine<S> {
    /// Loads both ledgers from the store. Failure here aborts startup: the
    /// engine never runs against silently-empty state.
    pub fn load(store: S) -> anyhow::Result<Self> {
        let assets = store.load_assets()?;
        let participants = store.load_participants()?;
        let last_reset = store.load_reset_marker()?;
        info!(
            assets = assets.len(),
            participants = participants.len(),
            "ledgers loaded"
        );
        Ok(Self {
            assets,
            participants,
            gate: ReviewGate::new(),
            store,
            last_reset,
        })
    }

    /// All mutations go through this single method.
    ///
    /// Guard failures return an error without touching state; on success the
    /// affected ledgers are persisted before the events are returned.
    pub fn apply(
        &mut self,
        today: NaiveDate,
        command: EngineCommand,
    ) -> Result<Vec<EngineEvent>, WorkflowError> {
        debug!(?command, %today, "applying command");
        match command {
            EngineCommand::RegisterContact { actor } => self.register_contact(actor),
            EngineCommand::SelectAsset { actor, asset_id } => self.select_asset(actor, asset_id),
            EngineCommand::ClearSelection { actor } => self.clear_selection(actor),
            EngineCommand::RequestAction { actor, action } => {
                self.request_action(today, actor, action)
            }
            EngineCommand::SubmitEvidence { actor, evidence } => {
                self.submit_evidence(today, actor, evidence)
            }
            EngineCommand::Decide {
                verdict,
                asset_id,
                action,
            } => self.decide(verdict, asset_id, action),
            EngineCommand::AddAsset { definition } => self.add_asset(definition),
            EngineCommand::DeleteAsset { asset_id } => self.delete_asset(asset_id),
            EngineCommand::Unsuspend { handle } => self.unsuspend(handle),
            EngineCommand::ResetScores { at } => self.reset_scores(at),
        }
    }

    fn register_contact(&mut self, actor: Actor) -> Result<Vec<EngineEvent>, WorkflowError> {
        let handle = actor.handle();
        if self.participants.contains_key(&handle) {
            return Ok(vec![]);
        }
        self.participants
            .insert(handle.clone(), Participant::new(actor.chat_id));
        self.save_participants()?;
        info!(participant = %handle, "participant registered");
        Ok(vec![EngineEvent::ParticipantRegistered { handle }])
    }

    fn select_asset(
        &mut self,
        actor: Actor,
        asset_id: AssetId,
    ) -> Result<Vec<EngineEvent>, WorkflowError> {
        let Some(asset) = self.assets.get(&asset_id).cloned() else {
            return Err(WorkflowError::UnknownAsset { asset_id });
        };
        let participant = self.contact_mut(&actor);
        participant.selected_asset = Some(asset_id.clone());
        // Navigating to an asset cancels any stale, evidence-less request.
        participant.pending_request = None;
        self.save_participants()?;
        Ok(vec![EngineEvent::AssetSelected { asset_id, asset }])
    }

    fn clear_selection(&mut self, actor: Actor) -> Result<Vec<EngineEvent>, WorkflowError> {
        let participant = self.contact_mut(&actor);
        participant.selected_asset = None;
        participant.pending_request = None;
        self.save_participants()?;
        Ok(vec![EngineEvent::SelectionCleared])
    }

    fn request_action(
        &mut self,
        today: NaiveDate,
        actor: Actor,
        action: ActionKind,
    ) -> Result<Vec<EngineEvent>, WorkflowError> {
        let handle = actor.handle();
        let (suspended, selected) = {
            let participant = self.contact_mut(&actor);
            (participant.suspended, participant.selected_asset.clone())
        };
        if suspended {
            return Err(WorkflowError::Suspended);
        }
        let Some(asset_id) = selected else {
            return Err(WorkflowError::NoAssetSelected);
        };
        let Some(asset) = self.assets.get(&asset_id) else {
            // The selection went stale: the asset has since been deleted.
            return Err(WorkflowError::UnknownAsset { asset_id });
        };
        let key = ReviewKey {
            asset_id: asset_id.clone(),
            action,
        };
        if self.gate.peek(&key).is_some() || self.gate.has_pending_from(&handle) {
            return Err(WorkflowError::ReviewInProgress);
        }
        if let Cooldown::Waiting {
            performed_on,
            next_eligible,
        } = cooldown::evaluate(asset, action, today)
        {
            return Err(WorkflowError::CooldownActive {
                performed_on,
                next_eligible,
            });
        }
        self.contact_mut(&actor).pending_request = Some(PendingRequest {
            asset_id: asset_id.clone(),
            action,
        });
        self.save_participants()?;
        info!(asset = %asset_id, action = %action, participant = %handle, "action requested");
        Ok(vec![EngineEvent::EvidenceRequested { asset_id, action }])
    }

    fn submit_evidence(
        &mut self,
        today: NaiveDate,
        actor: Actor,
        evidence: MediaRef,
    ) -> Result<Vec<EngineEvent>, WorkflowError> {
        let handle = actor.handle();
        let pending = self.contact_mut(&actor).pending_request.clone();
        let Some(PendingRequest { asset_id, action }) = pending else {
            return Err(WorkflowError::NoActionPending);
        };
        if !self.assets.contains_key(&asset_id) {
            // The asset was deleted between request and evidence.
            self.contact_mut(&actor).pending_request = None;
            self.save_participants()?;
            return Err(WorkflowError::UnknownAsset { asset_id });
        }
        let key = ReviewKey {
            asset_id: asset_id.clone(),
            action,
        };
        let entry = ReviewEntry {
            submitter: handle.clone(),
            submitted_on: today,
            evidence: evidence.clone(),
        };
        let admitted = self.gate.try_admit(key, entry).is_ok();
        // The request is consumed either way: on a lost race the participant
        // must re-request once the winning report is decided.
        self.contact_mut(&actor).pending_request = None;
        self.save_participants()?;
        if !admitted {
            return Err(WorkflowError::ReviewInProgress);
        }
        info!(asset = %asset_id, action = %action, participant = %handle, "report admitted for review");
        Ok(vec![EngineEvent::ReviewOpened {
            asset_id,
            action,
            submitter: handle,
            submitted_on: today,
            evidence,
        }])
    }

    fn decide(
        &mut self,
        verdict: Verdict,
        asset_id: AssetId,
        action: ActionKind,
    ) -> Result<Vec<EngineEvent>, WorkflowError> {
        let key = ReviewKey {
            asset_id: asset_id.clone(),
            action,
        };
        let Some(entry) = self.gate.resolve(&key) else {
            // Stale or duplicate decision; the transport absorbs this.
            debug!(asset = %asset_id, action = %action, "decision for unknown report");
            return Err(WorkflowError::ReportNotFound);
        };
        let Some(chat_id) = self
            .participants
            .get(&entry.submitter)
            .map(|participant| participant.chat_id)
        else {
            return Err(WorkflowError::ReportNotFound);
        };
        let target = NotifyTarget {
            handle: entry.submitter.clone(),
            chat_id,
        };
        match verdict {
            Verdict::Approve => {
                let Some(asset) = self.assets.get_mut(&asset_id) else {
                    return Err(WorkflowError::ReportNotFound);
                };
                asset.record_approval(action, entry.submitted_on);
                if let Some(participant) = self.participants.get_mut(&entry.submitter) {
                    participant.record_approval(action, APPROVAL_REWARD);
                }
                self.save_assets()?;
                self.save_participants()?;
                info!(asset = %asset_id, action = %action, participant = %target.handle, "report approved");
                Ok(vec![EngineEvent::ReviewApproved {
                    asset_id,
                    action,
                    participant: target,
                    reward: APPROVAL_REWARD,
                }])
            }
            Verdict::Warn => {
                let warnings = match self.participants.get_mut(&entry.submitter) {
                    Some(participant) => {
                        participant.warnings += 1;
                        participant.warnings
                    }
                    None => return Err(WorkflowError::ReportNotFound),
                };
                self.save_participants()?;
                info!(participant = %target.handle, warnings, "report rejected with warning");
                Ok(vec![EngineEvent::ReviewWarned {
                    participant: target,
                    warnings,
                }])
            }
            Verdict::Block => {
                match self.participants.get_mut(&entry.submitter) {
                    Some(participant) => participant.suspended = true,
                    None => return Err(WorkflowError::ReportNotFound),
                }
                self.save_participants()?;
                info!(participant = %target.handle, "report rejected, participant suspended");
                Ok(vec![EngineEvent::ReviewBlocked {
                    participant: target,
                }])
            }
        }
    }

    fn add_asset(
        &mut self,
        definition: AssetDefinition,
    ) -> Result<Vec<EngineEvent>, WorkflowError> {
        let (asset_id, asset) = definition.into_asset();
        if self.assets.contains_key(&asset_id) {
            return Err(WorkflowError::DuplicateAsset { asset_id });
        }
        self.assets.insert(asset_id.clone(), asset);
        self.save_assets()?;
        info!(asset = %asset_id, "asset added");
        Ok(vec![EngineEvent::AssetAdded { asset_id }])
    }

    fn delete_asset(&mut self, asset_id: AssetId) -> Result<Vec<EngineEvent>, WorkflowError> {
        if self.assets.remove(&asset_id).is_none() {
            return Err(WorkflowError::UnknownAsset { asset_id });
        }
        // Outstanding reports for the asset would otherwise hold their
        // single-flight slots forever and resolve against a missing record.
        let mut orphaned = Vec::new();
        for (key, entry) in self.gate.clear_asset(&asset_id) {
            if let Some(participant) = self.participants.get(&entry.submitter) {
                orphaned.push(OrphanedReport {
                    action: key.action,
                    participant: NotifyTarget {
                        handle: entry.submitter.clone(),
                        chat_id: participant.chat_id,
                    },
                });
            }
        }
        self.save_assets()?;
        info!(asset = %asset_id, orphaned = orphaned.len(), "asset deleted");
        Ok(vec![EngineEvent::AssetDeleted { asset_id, orphaned }])
    }

    fn unsuspend(&mut self, handle: Handle) -> Result<Vec<EngineEvent>, WorkflowError> {
        match self.participants.get_mut(&handle) {
            Some(participant) => participant.suspended = false,
            None => return Err(WorkflowError::UnknownParticipant { handle }),
        }
        self.save_participants()?;
        info!(participant = %handle, "participant unsuspended");
        Ok(vec![EngineEvent::ParticipantUnsuspended { handle }])
    }

    fn reset_scores(&mut self, at: DateTime<Utc>) -> Result<Vec<EngineEvent>, WorkflowError> {
        for participant in self.participants.values_mut() {
            participant.score = 0;
            participant.water_done = 0;
            participant.clean_done = 0;
        }
        self.last_reset = Some(at);
        self.save_participants()?;
        self.store
            .save_reset_marker(at)
            .map_err(|err| WorkflowError::Storage {
                message: err.to_string(),
            })?;
        info!(participants = self.participants.len(), "scores reset");
        Ok(vec![EngineEvent::ScoresReset {
            at,
            participants: self.participants.len(),
        }])
    }

    fn contact_mut(&mut self, actor: &Actor) -> &mut Participant {
        self.participants
            .entry(actor.handle())
            .or_insert_with(|| Participant::new(actor.chat_id))
    }

    fn save_assets(&self) -> Result<(), WorkflowError> {
        self.store
            .save_assets(&self.assets)
            .map_err(|err| WorkflowError::Storage {
                message: err.to_string(),
            })
    }

    fn save_participants(&self) -> Result<(), WorkflowError> {
        self.store
            .save_participants(&self.participants)
            .map_err(|err| WorkflowError::Storage {
                message: err.to_string(),
            })
    }
}
