//! Plant analysis data model.
//!
//! DESIGN
//! ======
//! `Analysis` is the canonical record handed to the UI. After creation it
//! is immutable except for `follow_up_questions`, which only grows. Field
//! names serialize in camelCase so the persisted history keeps the shape
//! the UI reads.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// TOXICITY
// =============================================================================

/// Closed four-level toxicity scale. No free text is ever accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToxicityLevel {
    None,
    Mild,
    Moderate,
    Severe,
}

impl ToxicityLevel {
    pub const ALL: [Self; 4] = [Self::None, Self::Mild, Self::Moderate, Self::Severe];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for ToxicityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown toxicity level: {0:?}")]
pub struct UnknownToxicityLevel(pub String);

impl FromStr for ToxicityLevel {
    type Err = UnknownToxicityLevel;

    /// Exact match only: `"Mild"` or `" mild"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownToxicityLevel(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toxicity {
    pub toxic: bool,
    pub level: ToxicityLevel,
    pub warning: String,
}

// =============================================================================
// CHAT MESSAGE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a follow-up conversation attached to an `Analysis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, content: content.into(), timestamp: now_ms() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// The fields an inference response supplies, already validated.
///
/// Produced by `services::validator::validate`; becomes an `Analysis` once
/// it is stamped with an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisDraft {
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub toxicity: Toxicity,
    pub symptoms: Vec<String>,
    pub precautions: Vec<String>,
}

impl AnalysisDraft {
    /// Stamp a fresh id and the current time onto the draft.
    #[must_use]
    pub fn into_analysis(self) -> Analysis {
        Analysis {
            id: Uuid::new_v4(),
            name: self.name,
            scientific_name: self.scientific_name,
            toxicity: self.toxicity,
            description: self.description,
            symptoms: self.symptoms,
            precautions: self.precautions,
            image_url: None,
            timestamp: now_ms(),
            follow_up_questions: Vec::new(),
        }
    }
}

/// Canonical validated plant-toxicity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub name: String,
    pub scientific_name: String,
    pub toxicity: Toxicity,
    pub description: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    /// Reference to the source image. Owned by the UI layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub follow_up_questions: Vec<ChatMessage>,
}

impl Analysis {
    /// Replace id and timestamp, keeping every other field.
    #[must_use]
    pub fn with_fresh_identity(self) -> Self {
        Self { id: Uuid::new_v4(), timestamp: now_ms(), ..self }
    }

    #[must_use]
    pub fn with_image_url(self, image_url: impl Into<String>) -> Self {
        Self { image_url: Some(image_url.into()), ..self }
    }
}

#[cfg(test)]
#[path = "plant_test.rs"]
mod tests;
