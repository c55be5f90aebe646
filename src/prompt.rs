//! Prompt builder: stage + session contents + brief → system/user prompt pair.
//!
//! Pure functions only. Prerequisite documents are checked here as well, so a
//! stage that cannot run never reaches the provider.

use crate::documents::{
    Channel, EmojiPolicy, Formality, HumorLevel, PointOfView, SentenceStyle, StageDocument,
};
use crate::error::StageError;
use crate::session::CampaignSession;
use crate::types::{CampaignBrief, StageId};

pub mod templates;

const NOT_PROVIDED: &str = "(not provided)";

/// Rendered prompts for one stage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system_instruction: String,
    pub user_payload: String,
}

/// Build the prompts for `stage` from the session's current documents.
pub fn build_prompt(
    stage: StageId,
    session: &CampaignSession,
    brief: &CampaignBrief,
) -> Result<PromptPair, StageError> {
    session.check_prerequisites(stage)?;
    match stage {
        StageId::VoiceCard => {
            brief.validate(stage)?;
            Ok(voice_card_prompt(brief))
        }
        StageId::Assets => {
            brief.validate(stage)?;
            let card = session
                .voice_card()
                .ok_or_else(|| missing(stage, "voice card required"))?;
            Ok(PromptPair {
                system_instruction: templates::ASSETS_SYSTEM.to_string(),
                user_payload: render(
                    templates::ASSETS_USER,
                    &[
                        ("product_description", brief.product_description.trim()),
                        ("voice_card", &card.to_prompt_json()),
                    ],
                ),
            })
        }
        StageId::Audit => {
            let card = session
                .voice_card()
                .ok_or_else(|| missing(stage, "voice card required"))?;
            let bundle = session
                .asset_bundle()
                .ok_or_else(|| missing(stage, "asset bundle required"))?;
            let refs = bundle
                .asset_refs()
                .iter()
                .map(|r| format!("- {} ({})", r.path, r.channel))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(PromptPair {
                system_instruction: render(
                    templates::AUDIT_SYSTEM,
                    &[("channel_choices", &Channel::choices())],
                ),
                user_payload: render(
                    templates::AUDIT_USER,
                    &[
                        ("voice_card", &card.to_prompt_json()),
                        ("asset_bundle", &bundle.to_prompt_json()),
                        ("asset_refs", or_placeholder(&refs)),
                    ],
                ),
            })
        }
    }
}

fn voice_card_prompt(brief: &CampaignBrief) -> PromptPair {
    PromptPair {
        system_instruction: render(
            templates::VOICE_CARD_SYSTEM,
            &[
                ("formality_choices", &Formality::choices()),
                ("sentence_style_choices", &SentenceStyle::choices()),
                ("humor_choices", &HumorLevel::choices()),
                ("emoji_choices", &EmojiPolicy::choices()),
                ("pov_choices", &PointOfView::choices()),
            ],
        ),
        user_payload: render(
            templates::VOICE_CARD_USER,
            &[
                ("brand", or_placeholder(&brief.brand)),
                ("audience", or_placeholder(&brief.audience)),
                ("objective", or_placeholder(&brief.objective)),
                ("product_description", brief.product_description.trim()),
            ],
        ),
    }
}

fn missing(stage: StageId, what: &str) -> StageError {
    StageError::Precondition {
        stage: stage.as_str(),
        missing: what.to_string(),
    }
}

fn or_placeholder(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_PROVIDED
    } else {
        trimmed
    }
}

/// Single-pass `{name}` substitution.
///
/// Substituted values are never rescanned, so user text that happens to
/// contain a placeholder is emitted verbatim. Unknown names are left alone,
/// which keeps the literal braces of the inline JSON schemas intact.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
