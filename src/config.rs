//! Configuration System
//!
//! Layered configuration for providers, the pipeline and logging. Values
//! merge from built-in defaults, the global file, the workspace files and
//! `BRANDLINE__*` environment variables, in that order.

use crate::adapter::DEFAULT_TEMPERATURE;
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::provider::CompletionOptions;
use crate::provider::ResponseFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandlineConfig {
    /// Named model providers
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings applied to every stage call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the provider entry to use
    #[serde(default)]
    pub provider: Option<String>,

    /// Model override; the provider's model is used when unset
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than zero".to_string());
        }
        if matches!(&self.model, Some(m) if m.trim().is_empty()) {
            return Err("Model override cannot be empty".to_string());
        }
        Ok(())
    }

    /// Options for stage calls. JSON-object mode unless the provider has none.
    pub fn completion_options(&self, provider_type: ProviderType) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            response_format: if provider_type.supports_json_mode() {
                ResponseFormat::JsonObject
            } else {
                ResponseFormat::Text
            },
        }
    }

    /// Configured temperature, when it differs from [`DEFAULT_TEMPERATURE`].
    pub fn temperature_override(&self) -> Option<f32> {
        ((self.temperature - DEFAULT_TEMPERATURE).abs() > f32::EPSILON).then_some(self.temperature)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String, String),
    Pipeline(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BrandlineConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        if let Err(e) = self.pipeline.validate() {
            errors.push(ValidationError::Pipeline(e));
        }

        if let Some(name) = &self.pipeline.provider {
            if !self.providers.contains_key(name) {
                errors.push(ValidationError::Pipeline(format!(
                    "Provider '{}' is not defined",
                    name
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Provider selected by name, else `pipeline.provider`, else the only one defined.
    pub fn select_provider(
        &self,
        name: Option<&str>,
    ) -> Result<(String, &ProviderConfig), ConfigError> {
        let name = match name.or(self.pipeline.provider.as_deref()) {
            Some(name) => name.to_string(),
            None if self.providers.len() == 1 => self
                .providers
                .keys()
                .next()
                .cloned()
                .unwrap_or_default(),
            None if self.providers.is_empty() => {
                return Err(ConfigError::Invalid(
                    "No providers configured; add a [providers.<name>] table".to_string(),
                ))
            }
            None => {
                return Err(ConfigError::Invalid(
                    "Several providers configured; set pipeline.provider or pass --provider"
                        .to_string(),
                ))
            }
        };
        let provider = self
            .providers
            .get(&name)
            .ok_or_else(|| ConfigError::Invalid(format!("Provider not found: {}", name)))?;
        Ok((name, provider))
    }

    /// TOML rendering with inline API keys masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut copy = self.clone();
        for provider in copy.providers.values_mut() {
            *provider = provider.redacted();
        }
        toml::to_string_pretty(&copy)
            .map_err(|e| ConfigError::Invalid(format!("Failed to render config: {}", e)))
    }
}
