//! LLM call adapter: one provider call per stage, JSON out.
//!
//! Provider failures surface as [`StageError::Provider`]; malformed output as
//! [`StageError::Extraction`] or [`StageError::Parse`]. Nothing is retried.
//! A caller-supplied cancellation token aborts the outbound request by
//! dropping its future.

use crate::error::StageError;
use crate::extract::{extract_json, ExtractedJson};
use crate::prompt::PromptPair;
use crate::provider::{
    ChatCompletionClient, ChatMessage, CompletionOptions, CompletionRequest, ResponseFormat,
};
use crate::types::StageId;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sampling temperature balancing creative variation against schema adherence.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct LlmAdapter {
    client: Arc<dyn ChatCompletionClient>,
    options: CompletionOptions,
}

impl LlmAdapter {
    pub fn new(client: Arc<dyn ChatCompletionClient>) -> Self {
        Self {
            client,
            options: CompletionOptions {
                temperature: Some(DEFAULT_TEMPERATURE),
                max_tokens: None,
                response_format: ResponseFormat::JsonObject,
            },
        }
    }

    pub fn with_options(client: Arc<dyn ChatCompletionClient>, options: CompletionOptions) -> Self {
        Self { client, options }
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    pub fn default_model(&self) -> &str {
        self.client.default_model()
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    /// Run one stage call and return the JSON object the model produced.
    pub async fn generate(
        &self,
        stage: StageId,
        prompt: &PromptPair,
        model: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractedJson, StageError> {
        if cancel.is_cancelled() {
            return Err(StageError::Cancelled {
                stage: stage.as_str(),
            });
        }

        let request = CompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::system(prompt.system_instruction.as_str()),
                ChatMessage::user(prompt.user_payload.as_str()),
            ],
            options: self.options.clone(),
        };
        debug!(
            stage = stage.as_str(),
            provider = self.client.provider_name(),
            model,
            system_chars = prompt.system_instruction.len(),
            user_chars = prompt.user_payload.len(),
            "Sending stage prompt"
        );

        let started = Instant::now();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(stage = stage.as_str(), "Provider call cancelled");
                return Err(StageError::Cancelled { stage: stage.as_str() });
            }
            result = self.client.complete(request) => result?,
        };
        debug!(
            stage = stage.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            total_tokens = response.usage.total_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "Provider responded"
        );

        let extracted = extract_json(&response.content)?;
        debug!(
            stage = stage.as_str(),
            path = extracted.path.as_str(),
            "Extracted stage JSON"
        );
        Ok(extracted)
    }
}
