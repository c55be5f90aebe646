//! Pipeline state machine: Voice Card → Assets → Audit.
//!
//! Every transition is a single attempt: claim the session, build the prompt
//! from the current snapshot, call the model, then replace exactly one slot.
//! Any failure before the final write leaves the session as it was.

use crate::adapter::LlmAdapter;
use crate::documents::{AssetBundle, AuditReport, StageDocument, VoiceCard};
use crate::error::StageError;
use crate::extract::ExtractionPath;
use crate::prompt::build_prompt;
use crate::session::{CampaignSession, PipelineState, SessionStore, StageDocumentSlot};
use crate::types::{CampaignBrief, SessionId, StageId};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of one successful stage transition.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutput {
    pub stage: StageId,
    pub session_id: SessionId,
    /// Session state after the write.
    pub state: PipelineState,
    /// The document now stored for `stage`.
    pub document: Value,
    /// Required fields the model left out; the document was stored anyway.
    pub schema_gaps: Vec<String>,
    #[serde(skip)]
    pub extraction: ExtractionPath,
}

pub struct CampaignPipeline {
    store: SessionStore,
    adapter: LlmAdapter,
    model: String,
}

impl CampaignPipeline {
    /// Pipeline using the provider's default model.
    pub fn new(adapter: LlmAdapter) -> Self {
        let model = adapter.default_model().to_string();
        Self {
            store: SessionStore::new(),
            adapter,
            model,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn adapter(&self) -> &LlmAdapter {
        &self.adapter
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn create_session(&self) -> SessionId {
        self.store.create_session()
    }

    /// Read-only snapshot of a session.
    pub fn get_session(&self, session_id: &SessionId) -> Result<CampaignSession, StageError> {
        self.store.get(session_id)
    }

    pub async fn generate_voice(
        &self,
        session_id: &SessionId,
        brief: CampaignBrief,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, StageError> {
        self.run_stage(StageId::VoiceCard, session_id, brief, cancel)
            .await
    }

    pub async fn generate_assets(
        &self,
        session_id: &SessionId,
        brief: CampaignBrief,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, StageError> {
        self.run_stage(StageId::Assets, session_id, brief, cancel).await
    }

    /// The audit reads only stored documents, so it takes no brief.
    pub async fn generate_audit(
        &self,
        session_id: &SessionId,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, StageError> {
        self.run_stage(StageId::Audit, session_id, CampaignBrief::default(), cancel)
            .await
    }

    /// Run one stage transition against a session, opening it on first use.
    pub async fn run_stage(
        &self,
        stage: StageId,
        session_id: &SessionId,
        brief: CampaignBrief,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, StageError> {
        let started = Instant::now();
        info!(session_id = %session_id, stage = stage.as_str(), "Stage started");
        match self.transition(stage, session_id, brief, cancel).await {
            Ok(output) => {
                info!(
                    session_id = %session_id,
                    stage = stage.as_str(),
                    state = output.state.as_str(),
                    extraction = output.extraction.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Stage committed"
                );
                Ok(output)
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    stage = stage.as_str(),
                    kind = err.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Stage failed"
                );
                Err(err)
            }
        }
    }

    async fn transition(
        &self,
        stage: StageId,
        session_id: &SessionId,
        brief: CampaignBrief,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, StageError> {
        let guard = self.store.begin_transition(session_id)?;
        let snapshot = guard.snapshot();
        let prompt = build_prompt(stage, &snapshot, &brief)?;

        let extracted = self
            .adapter
            .generate(stage, &prompt, &self.model, cancel)
            .await?;

        let (slot, schema_gaps) = match stage {
            StageId::VoiceCard => {
                let card = VoiceCard::from_value(extracted.value);
                let gaps = card.schema_gaps();
                (StageDocumentSlot::Voice(card, brief), gaps)
            }
            StageId::Assets => {
                let bundle = AssetBundle::from_value(extracted.value);
                let gaps = bundle.schema_gaps();
                (StageDocumentSlot::Assets(bundle), gaps)
            }
            StageId::Audit => {
                let report = AuditReport::from_value(extracted.value);
                let gaps = match snapshot.asset_bundle() {
                    Some(bundle) => report.coverage_gaps(bundle),
                    None => report.schema_gaps(),
                };
                (StageDocumentSlot::Audit(report), gaps)
            }
        };
        if !schema_gaps.is_empty() {
            warn!(
                session_id = %session_id,
                stage = stage.as_str(),
                missing = ?schema_gaps,
                "Stage output has schema gaps; storing with defaults"
            );
        }

        let document = slot.value().clone();
        let session = guard.commit(slot)?;
        Ok(StageOutput {
            stage,
            session_id: session_id.clone(),
            state: session.state(),
            document,
            schema_gaps,
            extraction: extracted.path,
        })
    }
}
