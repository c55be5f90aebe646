//! Error types for the Brandline campaign pipeline.

use thiserror::Error;

/// Failures of the model provider call itself (network, auth, quota).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to build provider client: {0}")]
    Client(String),
}

/// Everything a stage transition can report back to the caller of `run_stage`.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("No JSON object found in model output")]
    Extraction { excerpt: String },

    #[error("Model output contains malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Stage '{stage}' output is missing required field '{field}'")]
    Schema { stage: &'static str, field: String },

    #[error("Stage '{stage}' cannot run: {missing}")]
    Precondition { stage: &'static str, missing: String },

    #[error("Session {session_id} already has a stage transition in flight")]
    Busy { session_id: String },

    #[error("Stage '{stage}' was cancelled before the provider answered")]
    Cancelled { stage: &'static str },

    #[error("Unknown session: {0}")]
    UnknownSession(String),
}

impl StageError {
    /// Stable identifier for logs and machine consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Provider(_) => "provider_error",
            StageError::Extraction { .. } => "extraction_error",
            StageError::Parse(_) => "parse_error",
            StageError::Schema { .. } => "schema_error",
            StageError::Precondition { .. } => "precondition_error",
            StageError::Busy { .. } => "busy_error",
            StageError::Cancelled { .. } => "cancelled",
            StageError::UnknownSession(_) => "unknown_session",
        }
    }

    /// Message suitable for showing to the person who triggered the stage.
    pub fn user_message(&self) -> String {
        let hint = match self {
            StageError::Provider(ProviderError::AuthFailed(_)) => {
                "Check the provider API key and try again."
            }
            StageError::Provider(ProviderError::RateLimited(_)) => {
                "The provider is throttling requests; wait a moment and rerun the stage."
            }
            StageError::Provider(ProviderError::ModelNotFound(_)) => {
                "Pick a model the provider actually serves."
            }
            StageError::Provider(ProviderError::NotConfigured(_))
            | StageError::Provider(ProviderError::Client(_)) => {
                "Fix the provider configuration before generating."
            }
            StageError::Provider(_) => "The model service failed; rerun the stage.",
            StageError::Extraction { .. } | StageError::Parse(_) => {
                "The model answered, but not with usable JSON. Rerunning the stage usually helps."
            }
            StageError::Schema { .. } => {
                "The model skipped part of the expected structure; regenerate this stage."
            }
            StageError::Precondition { .. } => "Complete the earlier stage first.",
            StageError::Busy { .. } => "Wait for the running stage to finish.",
            StageError::Cancelled { .. } => "Generation was cancelled; nothing was changed.",
            StageError::UnknownSession(_) => "Start a new session.",
        };
        format!("{self}. {hint}")
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}
