//! JSON recovery from raw model text.
//!
//! Models asked for a single JSON object still sometimes wrap it in prose or
//! code fences. The extractor accepts the clean case directly and otherwise
//! falls back to the widest brace-delimited block in the text. It performs
//! no schema checks; those belong to the documents that consume the value.

use crate::error::StageError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const EXCERPT_CHARS: usize = 120;

/// How the object was located in the model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    /// The whole trimmed text was the object.
    Direct,
    /// The object was cut out of surrounding prose.
    Recovered,
}

impl ExtractionPath {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionPath::Direct => "direct",
            ExtractionPath::Recovered => "recovered",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedJson {
    pub value: Value,
    pub path: ExtractionPath,
}

fn brace_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Greedy: first `{` through last `}`, newlines included.
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("brace block pattern is valid"))
}

/// Extract a single JSON value from model text.
pub fn extract_json(text: &str) -> Result<ExtractedJson, StageError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        let value = serde_json::from_str(trimmed).map_err(StageError::Parse)?;
        return Ok(ExtractedJson {
            value,
            path: ExtractionPath::Direct,
        });
    }

    let candidate = brace_block()
        .find(trimmed)
        .ok_or_else(|| StageError::Extraction {
            excerpt: excerpt(trimmed),
        })?;
    let value = serde_json::from_str(candidate.as_str()).map_err(StageError::Parse)?;
    Ok(ExtractedJson {
        value,
        path: ExtractionPath::Recovered,
    })
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push('…');
    }
    out
}
