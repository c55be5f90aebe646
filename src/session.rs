//! Campaign session store.
//!
//! Each session holds at most one document per stage. Sessions are fully
//! independent; the only shared structure is the id → slot index. Writes go
//! through a [`TransitionGuard`], which is how the pipeline serializes
//! transitions: one in flight per session, any other attempt fails fast.

use crate::documents::{AssetBundle, AuditReport, StageDocument, VoiceCard};
use crate::error::StageError;
use crate::types::{CampaignBrief, SessionId, StageId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Progress of a session through the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Empty,
    VoiceReady,
    AssetsReady,
    AuditReady,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Empty => "empty",
            PipelineState::VoiceReady => "voice_ready",
            PipelineState::AssetsReady => "assets_ready",
            PipelineState::AuditReady => "audit_ready",
        }
    }
}

/// Read-only view of one campaign's stage outputs.
///
/// Regenerating an upstream stage replaces only that stage's slot; downstream
/// documents stay in place even if they were built from a superseded voice.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSession {
    session_id: SessionId,
    brief: Option<CampaignBrief>,
    voice_card: Option<VoiceCard>,
    asset_bundle: Option<AssetBundle>,
    audit_report: Option<AuditReport>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CampaignSession {
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            brief: None,
            voice_card: None,
            asset_bundle: None,
            audit_report: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Brief used by the latest successful voice generation.
    pub fn brief(&self) -> Option<&CampaignBrief> {
        self.brief.as_ref()
    }

    pub fn voice_card(&self) -> Option<&VoiceCard> {
        self.voice_card.as_ref()
    }

    pub fn asset_bundle(&self) -> Option<&AssetBundle> {
        self.asset_bundle.as_ref()
    }

    pub fn audit_report(&self) -> Option<&AuditReport> {
        self.audit_report.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Furthest stage whose prerequisites are all present.
    pub fn state(&self) -> PipelineState {
        match (&self.voice_card, &self.asset_bundle, &self.audit_report) {
            (Some(_), Some(_), Some(_)) => PipelineState::AuditReady,
            (Some(_), Some(_), None) => PipelineState::AssetsReady,
            (Some(_), None, _) => PipelineState::VoiceReady,
            (None, _, _) => PipelineState::Empty,
        }
    }

    /// Check that every document `stage` consumes is present.
    pub fn check_prerequisites(&self, stage: StageId) -> Result<(), StageError> {
        let missing = match stage {
            StageId::VoiceCard => None,
            StageId::Assets if self.voice_card.is_none() => Some("voice card required"),
            StageId::Assets => None,
            StageId::Audit => match (&self.voice_card, &self.asset_bundle) {
                (None, None) => Some("voice card and asset bundle required"),
                (None, Some(_)) => Some("voice card required"),
                (Some(_), None) => Some("asset bundle required"),
                (Some(_), Some(_)) => None,
            },
        };
        match missing {
            Some(missing) => Err(StageError::Precondition {
                stage: stage.as_str(),
                missing: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Pretty-printed JSON for export collaborators.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn set_voice_card(&mut self, card: VoiceCard, brief: CampaignBrief) {
        self.voice_card = Some(card);
        self.brief = Some(brief);
        self.touch();
    }

    pub(crate) fn set_asset_bundle(&mut self, bundle: AssetBundle) -> Result<(), StageError> {
        self.check_prerequisites(StageId::Assets)?;
        self.asset_bundle = Some(bundle);
        self.touch();
        Ok(())
    }

    pub(crate) fn set_audit_report(&mut self, report: AuditReport) -> Result<(), StageError> {
        self.check_prerequisites(StageId::Audit)?;
        self.audit_report = Some(report);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Stage output ready to be written into its slot.
#[derive(Debug, Clone)]
pub(crate) enum StageDocumentSlot {
    Voice(VoiceCard, CampaignBrief),
    Assets(AssetBundle),
    Audit(AuditReport),
}

impl StageDocumentSlot {
    pub(crate) fn value(&self) -> &serde_json::Value {
        match self {
            StageDocumentSlot::Voice(card, _) => card.as_value(),
            StageDocumentSlot::Assets(bundle) => bundle.as_value(),
            StageDocumentSlot::Audit(report) => report.as_value(),
        }
    }
}

struct SessionSlot {
    session: RwLock<CampaignSession>,
    in_flight: AtomicBool,
}

/// Holds every open session, keyed by [`SessionId`].
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new, empty session.
    pub fn create_session(&self) -> SessionId {
        let session_id = SessionId::generate();
        self.ensure(&session_id);
        session_id
    }

    /// Open `session_id` if it does not exist yet.
    pub fn ensure(&self, session_id: &SessionId) {
        self.slot_or_insert(session_id);
    }

    /// Snapshot of a session.
    pub fn get(&self, session_id: &SessionId) -> Result<CampaignSession, StageError> {
        let slot = self
            .sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| StageError::UnknownSession(session_id.to_string()))?;
        let snapshot = slot.session.read().clone();
        Ok(snapshot)
    }

    /// Drop a session. Fails with [`StageError::Busy`] while a transition
    /// holds it; returns `false` when the id was never opened.
    pub fn remove(&self, session_id: &SessionId) -> Result<bool, StageError> {
        let mut sessions = self.sessions.write();
        let Some(slot) = sessions.get(session_id) else {
            return Ok(false);
        };
        // The claim is never released: a guard racing on the detached slot sees Busy.
        if slot
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StageError::Busy {
                session_id: session_id.to_string(),
            });
        }
        sessions.remove(session_id);
        debug!(session_id = %session_id, "Session removed");
        Ok(true)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Claim the session for one transition, opening it on first use.
    ///
    /// Fails with [`StageError::Busy`] while another guard for the same
    /// session is alive; never waits.
    pub fn begin_transition(&self, session_id: &SessionId) -> Result<TransitionGuard, StageError> {
        let slot = self.slot_or_insert(session_id);
        if slot
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StageError::Busy {
                session_id: session_id.to_string(),
            });
        }
        debug!(session_id = %session_id, "Transition lock acquired");
        Ok(TransitionGuard {
            session_id: session_id.clone(),
            slot,
        })
    }

    fn slot_or_insert(&self, session_id: &SessionId) -> Arc<SessionSlot> {
        if let Some(slot) = self.sessions.read().get(session_id) {
            return slot.clone();
        }
        self.sessions
            .write()
            .entry(session_id.clone())
            .or_insert_with(|| {
                Arc::new(SessionSlot {
                    session: RwLock::new(CampaignSession::new(session_id.clone())),
                    in_flight: AtomicBool::new(false),
                })
            })
            .clone()
    }
}

/// Exclusive right to run one transition against a session.
///
/// Released on drop, whatever the transition's outcome.
pub struct TransitionGuard {
    session_id: SessionId,
    slot: Arc<SessionSlot>,
}

impl TransitionGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn snapshot(&self) -> CampaignSession {
        self.slot.session.read().clone()
    }

    /// Replace one stage slot, leaving the others untouched.
    pub(crate) fn commit(&self, document: StageDocumentSlot) -> Result<CampaignSession, StageError> {
        let mut session = self.slot.session.write();
        match document {
            StageDocumentSlot::Voice(card, brief) => session.set_voice_card(card, brief),
            StageDocumentSlot::Assets(bundle) => session.set_asset_bundle(bundle)?,
            StageDocumentSlot::Audit(report) => session.set_audit_report(report)?,
        }
        Ok(session.clone())
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        self.slot.in_flight.store(false, Ordering::Release);
        debug!(session_id = %self.session_id, "Transition lock released");
    }
}
