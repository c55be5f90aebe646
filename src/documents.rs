//! Stage documents: the Voice Card, the Asset Bundle and the Audit Report.
//!
//! Model output is untrusted with respect to structure, so every document
//! keeps the raw JSON it was built from and reads fields defensively. A
//! missing or mistyped field yields an empty default instead of an error;
//! consumers that genuinely cannot proceed without a field call
//! [`StageDocument::require`] and get a [`StageError::Schema`].

use crate::error::StageError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Number of entries the email sequence is expected to contain.
pub const EMAIL_SEQUENCE_LEN: usize = 3;

macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Pipe-separated value set, as rendered into output schemas.
            pub fn choices() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join("|")
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = normalize_token(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| format!("unknown {}: {}", stringify!($name), s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum!(Formality {
    Casual => "casual",
    Neutral => "neutral",
    Formal => "formal",
});

closed_enum!(SentenceStyle {
    Short => "short",
    Mixed => "mixed",
    Long => "long",
});

closed_enum!(HumorLevel {
    None => "none",
    Light => "light",
    Playful => "playful",
});

closed_enum!(EmojiPolicy {
    Never => "never",
    Sparing => "sparing",
    Frequent => "frequent",
});

closed_enum!(PointOfView {
    FirstPersonPlural => "first_person_plural",
    SecondPerson => "second_person",
    ThirdPerson => "third_person",
});

closed_enum!(
    /// Where an asset is published.
    Channel {
        Email => "email",
        Linkedin => "linkedin",
        Instagram => "instagram",
        X => "x",
        Web => "web",
    }
);

impl Channel {
    /// Channels that carry social posts, in bundle order.
    pub const SOCIAL: &'static [Channel] = &[Channel::Linkedin, Channel::Instagram, Channel::X];
}

fn normalize_token(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn strings_at(value: &Value, pointer: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn enum_at<T: FromStr>(value: &Value, pointer: &str) -> Option<T> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// Numbers arrive as JSON numbers or, occasionally, as numeric strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Behavior shared by every stage document.
pub trait StageDocument: Sized {
    /// Stage that produces the document.
    const STAGE: &'static str;
    /// Top-level keys downstream consumers read.
    const REQUIRED_KEYS: &'static [&'static str];

    fn from_value(value: Value) -> Self;

    fn as_value(&self) -> &Value;

    /// Required top-level keys that are absent or null.
    fn schema_gaps(&self) -> Vec<String> {
        Self::REQUIRED_KEYS
            .iter()
            .filter(|key| self.as_value().get(**key).map_or(true, Value::is_null))
            .map(|key| key.to_string())
            .collect()
    }

    /// Field access for consumers that cannot fall back to a default.
    fn require(&self, key: &str) -> Result<&Value, StageError> {
        match self.as_value().get(key) {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(StageError::Schema {
                stage: Self::STAGE,
                field: key.to_string(),
            }),
        }
    }

    /// Compact serialization embedded into downstream prompts.
    fn to_prompt_json(&self) -> String {
        self.as_value().to_string()
    }
}

/// Canonical brand-voice definition produced by the first stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceCard(Value);

impl StageDocument for VoiceCard {
    const STAGE: &'static str = "voice_card";
    const REQUIRED_KEYS: &'static [&'static str] =
        &["brand", "voice", "lexicon", "style_rules", "guardrails"];

    fn from_value(value: Value) -> Self {
        Self(value)
    }

    fn as_value(&self) -> &Value {
        &self.0
    }
}

impl VoiceCard {
    pub fn brand_name(&self) -> &str {
        str_at(&self.0, "/brand/name")
    }

    pub fn positioning(&self) -> &str {
        str_at(&self.0, "/brand/one_line_positioning")
    }

    pub fn audience(&self) -> &str {
        str_at(&self.0, "/brand/audience")
    }

    pub fn objective(&self) -> &str {
        str_at(&self.0, "/brand/objective")
    }

    pub fn tone_traits(&self) -> Vec<String> {
        strings_at(&self.0, "/voice/tone_traits")
    }

    pub fn formality(&self) -> Option<Formality> {
        enum_at(&self.0, "/voice/formality")
    }

    pub fn sentence_style(&self) -> Option<SentenceStyle> {
        enum_at(&self.0, "/voice/sentence_style")
    }

    pub fn humor(&self) -> Option<HumorLevel> {
        enum_at(&self.0, "/voice/humor")
    }

    pub fn emoji_policy(&self) -> Option<EmojiPolicy> {
        enum_at(&self.0, "/voice/emoji_policy")
    }

    pub fn point_of_view(&self) -> Option<PointOfView> {
        enum_at(&self.0, "/voice/point_of_view")
    }

    pub fn words_to_use(&self) -> Vec<String> {
        strings_at(&self.0, "/lexicon/use")
    }

    pub fn words_to_avoid(&self) -> Vec<String> {
        strings_at(&self.0, "/lexicon/avoid")
    }

    pub fn style_rules(&self) -> Vec<String> {
        strings_at(&self.0, "/style_rules")
    }

    pub fn guardrails(&self) -> Vec<String> {
        strings_at(&self.0, "/guardrails")
    }
}

/// One entry of the email sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailEntry {
    pub goal: String,
    pub subject: String,
    pub preheader: String,
    pub body: String,
    pub cta: String,
}

/// Multi-channel campaign copy produced by the second stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetBundle(Value);

impl StageDocument for AssetBundle {
    const STAGE: &'static str = "assets";
    const REQUIRED_KEYS: &'static [&'static str] = &[
        "campaign_core",
        "email_sequence",
        "social_posts",
        "landing_page",
    ];

    fn from_value(value: Value) -> Self {
        Self(value)
    }

    fn as_value(&self) -> &Value {
        &self.0
    }

    fn schema_gaps(&self) -> Vec<String> {
        let mut gaps: Vec<String> = Self::REQUIRED_KEYS
            .iter()
            .filter(|key| self.0.get(**key).map_or(true, Value::is_null))
            .map(|key| key.to_string())
            .collect();
        let emails = array_at(&self.0, "/email_sequence").len();
        if self.0.get("email_sequence").is_some() && emails != EMAIL_SEQUENCE_LEN {
            gaps.push(format!(
                "email_sequence (expected {EMAIL_SEQUENCE_LEN} entries, got {emails})"
            ));
        }
        gaps
    }
}

impl AssetBundle {
    pub fn big_idea(&self) -> &str {
        str_at(&self.0, "/campaign_core/big_idea")
    }

    pub fn key_messages(&self) -> Vec<String> {
        strings_at(&self.0, "/campaign_core/key_messages")
    }

    pub fn primary_cta(&self) -> &str {
        str_at(&self.0, "/campaign_core/primary_cta")
    }

    pub fn emails(&self) -> Vec<EmailEntry> {
        array_at(&self.0, "/email_sequence")
            .iter()
            .map(|entry| EmailEntry {
                goal: str_at(entry, "/goal").to_string(),
                subject: str_at(entry, "/subject").to_string(),
                preheader: str_at(entry, "/preheader").to_string(),
                body: str_at(entry, "/body").to_string(),
                cta: str_at(entry, "/cta").to_string(),
            })
            .collect()
    }

    /// Raw post objects for a social channel; the shape differs per channel.
    pub fn social_posts(&self, channel: Channel) -> &[Value] {
        array_at(&self.0, &format!("/social_posts/{}", channel.as_str()))
    }

    pub fn landing_headline(&self) -> &str {
        str_at(&self.0, "/landing_page/headline")
    }

    pub fn landing_sections(&self) -> &[Value] {
        array_at(&self.0, "/landing_page/sections")
    }

    /// Paths of every auditable asset in the bundle.
    pub fn asset_refs(&self) -> Vec<AssetRef> {
        let mut refs = Vec::new();
        for index in 0..array_at(&self.0, "/email_sequence").len() {
            refs.push(AssetRef {
                path: format!("email_sequence[{index}]"),
                channel: Channel::Email,
            });
        }
        for channel in Channel::SOCIAL {
            for index in 0..self.social_posts(*channel).len() {
                refs.push(AssetRef {
                    path: format!("social_posts.{}[{index}]", channel.as_str()),
                    channel: *channel,
                });
            }
        }
        if self.0.get("landing_page").is_some_and(Value::is_object) {
            refs.push(AssetRef {
                path: "landing_page".to_string(),
                channel: Channel::Web,
            });
        }
        refs
    }

    /// Resolve an asset path such as `social_posts.x[0]` inside the bundle.
    pub fn resolve(&self, asset_path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in asset_path.split('.') {
            let (key, index) = match segment.split_once('[') {
                Some((key, rest)) => (key, rest.strip_suffix(']')?.parse::<usize>().ok()),
                None => (segment, None),
            };
            current = current.get(key)?;
            if let Some(index) = index {
                current = current.get(index)?;
            }
        }
        Some(current)
    }
}

/// Location of one asset inside an [`AssetBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRef {
    pub path: String,
    pub channel: Channel,
}

/// One scored asset in the audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditItem {
    pub asset_id: String,
    pub channel: Option<Channel>,
    /// Integer score, clamped to 1..=5; `None` when the model omitted it.
    pub score: Option<u8>,
    pub rationale: String,
    pub fix: String,
}

/// Scored consistency review produced by the third stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditReport(Value);

impl StageDocument for AuditReport {
    const STAGE: &'static str = "audit";
    const REQUIRED_KEYS: &'static [&'static str] = &["overall", "items"];

    fn from_value(value: Value) -> Self {
        Self(value)
    }

    fn as_value(&self) -> &Value {
        &self.0
    }
}

impl AuditReport {
    pub fn items(&self) -> Vec<AuditItem> {
        array_at(&self.0, "/items")
            .iter()
            .map(|item| AuditItem {
                asset_id: str_at(item, "/asset_id").to_string(),
                channel: enum_at(item, "/channel"),
                score: item
                    .get("score")
                    .and_then(number)
                    .map(|s| s.round().clamp(1.0, 5.0) as u8),
                rationale: str_at(item, "/rationale").to_string(),
                fix: str_at(item, "/fix").to_string(),
            })
            .collect()
    }

    /// Overall score clamped to 1..=5. Falls back to the mean of item
    /// scores when the summary is missing.
    pub fn average_score(&self) -> Option<f64> {
        if let Some(score) = self.0.pointer("/overall/average_score").and_then(number) {
            return Some(score.clamp(1.0, 5.0));
        }
        let scores: Vec<f64> = self
            .items()
            .iter()
            .filter_map(|item| item.score.map(f64::from))
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    /// Assets in `bundle` that no audit item refers to.
    pub fn unaudited(&self, bundle: &AssetBundle) -> Vec<AssetRef> {
        let audited: HashSet<String> = self
            .items()
            .into_iter()
            .map(|item| item.asset_id.trim().to_string())
            .collect();
        bundle
            .asset_refs()
            .into_iter()
            .filter(|asset| !audited.contains(&asset.path))
            .collect()
    }

    /// Missing required keys plus one gap per asset the audit skipped.
    pub fn coverage_gaps(&self, bundle: &AssetBundle) -> Vec<String> {
        let mut gaps = self.schema_gaps();
        gaps.extend(
            self.unaudited(bundle)
                .into_iter()
                .map(|asset| format!("items (no entry for {})", asset.path)),
        );
        gaps
    }

    pub fn drift_themes(&self) -> Vec<String> {
        strings_at(&self.0, "/overall/top_drift_themes")
    }

    pub fn global_fixes(&self) -> Vec<String> {
        strings_at(&self.0, "/overall/global_fixes")
    }
}
