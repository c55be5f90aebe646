//! Core identifiers and inputs shared across the pipeline.

use crate::error::StageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// The three ordered generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    VoiceCard,
    Assets,
    Audit,
}

impl StageId {
    pub const ALL: [StageId; 3] = [StageId::VoiceCard, StageId::Assets, StageId::Audit];

    pub fn as_str(self) -> &'static str {
        match self {
            StageId::VoiceCard => "voice_card",
            StageId::Assets => "assets",
            StageId::Audit => "audit",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "voice_card" | "voice" => Ok(StageId::VoiceCard),
            "assets" => Ok(StageId::Assets),
            "audit" => Ok(StageId::Audit),
            other => Err(format!(
                "Invalid stage: {}. Must be voice_card, assets, or audit",
                other
            )),
        }
    }
}

/// Key identifying one campaign session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh identifier of the form `sess-<millis>-<pid>-<seq>`.
    pub fn generate() -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let pid = std::process::id();
        let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("sess-{ts}-{pid}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-supplied fields for a campaign.
///
/// The product description is the single source of truth for every stage.
/// Transitions take the brief by value, so it cannot change mid-run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignBrief {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub objective: String,
    pub product_description: String,
}

impl CampaignBrief {
    pub fn new(
        brand: impl Into<String>,
        audience: impl Into<String>,
        objective: impl Into<String>,
        product_description: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            audience: audience.into(),
            objective: objective.into(),
            product_description: product_description.into(),
        }
    }

    /// Reject a brief that gives the model nothing to work from.
    pub fn validate(&self, stage: StageId) -> Result<(), StageError> {
        if self.product_description.trim().is_empty() {
            return Err(StageError::Precondition {
                stage: stage.as_str(),
                missing: "product description required".to_string(),
            });
        }
        Ok(())
    }
}
