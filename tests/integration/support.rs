//! Shared test utilities: a scripted provider and canned stage documents.

use async_trait::async_trait;
use brandline::adapter::LlmAdapter;
use brandline::error::ProviderError;
use brandline::pipeline::CampaignPipeline;
use brandline::provider::{
    ChatCompletionClient, CompletionRequest, CompletionResponse, TokenUsage,
};
use brandline::types::CampaignBrief;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Replays queued replies in order, recording every request.
///
/// A gated provider parks each call until [`ScriptedProvider::release`]
/// hands out a permit. The reply is taken only after the gate opens, so a
/// cancelled call leaves the script intact.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
    gate: Option<Semaphore>,
    entered: Notify,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            entered: Notify::new(),
        })
    }

    pub fn gated(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            gate: Some(Semaphore::new(0)),
            entered: Notify::new(),
        })
    }

    /// Let one parked call through.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Wait until a call has reached the provider.
    pub async fn wait_for_call(&self) {
        self.entered.notified().await;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChatCompletionClient for ScriptedProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.lock().push(request);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
            permit.forget();
        }
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::RequestFailed("script exhausted".into())));
        reply.map(|content| CompletionResponse {
            content,
            model: "scripted".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

pub fn pipeline(provider: &Arc<ScriptedProvider>) -> CampaignPipeline {
    CampaignPipeline::new(LlmAdapter::new(provider.clone()))
}

pub fn acme_brief() -> CampaignBrief {
    CampaignBrief::new(
        "Acme",
        "Busy gym-goers",
        "Drive trial sign-ups",
        "A self-cleaning water bottle with a UV cap that kills 99% of bacteria in 60 seconds.",
    )
}

pub fn voice_card() -> Value {
    json!({
        "brand": {
            "name": "Acme",
            "one_line_positioning": "Clean water without the scrubbing",
            "audience": "Busy gym-goers",
            "objective": "Drive trial sign-ups"
        },
        "voice": {
            "tone_traits": ["energetic", "direct", "upbeat"],
            "formality": "casual",
            "sentence_style": "short",
            "humor": "light",
            "emoji_policy": "sparing",
            "point_of_view": "second_person"
        },
        "lexicon": {
            "use": ["fresh", "effortless", "sip"],
            "avoid": ["germ-free", "medical-grade"]
        },
        "style_rules": ["Lead with the benefit", "One idea per sentence"],
        "guardrails": ["No medical claims"]
    })
}

pub fn asset_bundle() -> Value {
    json!({
        "campaign_core": {
            "big_idea": "Fresh in 60",
            "key_messages": ["UV cap cleans itself", "No scrubbing"],
            "primary_cta": "Start your trial"
        },
        "email_sequence": [
            {"goal": "welcome", "subject": "Meet your new bottle", "preheader": "Clean in 60s",
             "body": "Hi there", "cta": "Try it"},
            {"goal": "educate", "subject": "Still scrubbing?", "preheader": "Stop",
             "body": "Let the cap work", "cta": "Try it"},
            {"goal": "convert", "subject": "Last call", "preheader": "Trial ends soon",
             "body": "Grab it", "cta": "Start now"}
        ],
        "social_posts": {
            "linkedin": [{"hook": "Fresh water, zero effort.", "body": "The UV cap does the scrubbing.",
                          "cta": "Start your trial", "hashtags": ["#hydration"]}],
            "instagram": [{"caption": "Sip fresh.", "visual_direction": "Bottle on a gym bench",
                           "hashtags": ["#gymlife"]}],
            "x": [{"text": "60 seconds to fresh."}]
        },
        "landing_page": {
            "headline": "Fresh in 60",
            "subhead": "The bottle that cleans itself",
            "sections": [{"heading": "How it works", "body": "UV light does the work."}],
            "faq": [{"q": "How long does a cycle take?", "a": "60 seconds."}],
            "meta_title": "Acme UV bottle",
            "meta_description": "A self-cleaning bottle with a UV cap."
        }
    })
}

/// One item per asset in [`asset_bundle`].
pub fn audit_report() -> Value {
    json!({
        "overall": {
            "average_score": 4.3,
            "top_drift_themes": ["Landing page gets formal"],
            "global_fixes": ["Keep sentences short everywhere"]
        },
        "items": [
            {"asset_id": "email_sequence[0]", "channel": "email", "score": 5,
             "rationale": "On voice", "fix": "None"},
            {"asset_id": "email_sequence[1]", "channel": "email", "score": 4,
             "rationale": "Slightly long", "fix": "Trim the second sentence"},
            {"asset_id": "email_sequence[2]", "channel": "email", "score": 5,
             "rationale": "Direct and upbeat", "fix": "None"},
            {"asset_id": "social_posts.linkedin[0]", "channel": "linkedin", "score": 4,
             "rationale": "Good hook", "fix": "Drop one hashtag"},
            {"asset_id": "social_posts.instagram[0]", "channel": "instagram", "score": 5,
             "rationale": "Playful", "fix": "None"},
            {"asset_id": "social_posts.x[0]", "channel": "x", "score": 4,
             "rationale": "Punchy", "fix": "Add the CTA"},
            {"asset_id": "landing_page", "channel": "web", "score": 3,
             "rationale": "Stiff phrasing", "fix": "Use second person"}
        ]
    })
}

/// Wrap a document in chatty prose the way hosted models often answer.
pub fn in_prose(value: &Value) -> String {
    format!("Sure! Here is the JSON you asked for:\n{}\nLet me know if you need changes.", value)
}
