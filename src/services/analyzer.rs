//! Analysis orchestrator — plant photo to a validated `Analysis`.
//!
//! DESIGN
//! ======
//! One pipeline: upload check → encode → prompt + image request → one
//! inference call → extract the JSON object from free text → decode →
//! validate → stamp identity. The inference call is the only suspension
//! point. Nothing is retried.
//!
//! ERROR HANDLING
//! ==============
//! `analyze` never fails. Every pipeline error is classified, logged with
//! its details, and replaced by a clearly labeled fallback `Analysis`
//! whose warning is the classified user-facing message. The UI always
//! receives something renderable. The follow-up path in `conversation`
//! surfaces errors instead; that split is a product decision.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ClassifiedError, Classify, ErrorCode, classify};
use crate::image::{EncodingError, ImageRejected, check_upload, encode};
use crate::llm::LlmChat;
use crate::llm::config::GenerationSettings;
use crate::llm::types::{ChatRequest, ContentBlock, LlmError, Message};
use crate::plant::{Analysis, AnalysisDraft, Toxicity, ToxicityLevel};
use crate::services::validator::{ValidationError, validate};

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a plant identification and toxicity expert. Analyze the image and provide detailed information about:
1. Plant identification (common name and scientific name)
2. Toxicity level (none, mild, moderate, severe)
3. Description of the plant
4. Toxic parts (if any)
5. Symptoms of toxicity (if applicable)
6. Safety precautions

IMPORTANT: You must respond with ONLY a valid JSON object in the following format:
{
  "name": "Common Plant Name",
  "scientificName": "Scientific Name",
  "toxicity": {
    "toxic": boolean,
    "level": "none" | "mild" | "moderate" | "severe",
    "warning": "Clear warning message about toxicity"
  },
  "description": "Detailed plant description",
  "symptoms": ["Symptom 1", "Symptom 2"],
  "precautions": ["Precaution 1", "Precaution 2"]
}"#;

const ANALYSIS_USER_PROMPT: &str = "Analyze this plant image and provide toxicity information in JSON format.";

pub const FALLBACK_NAME: &str = "Error Analyzing Plant";
const FALLBACK_SCIENTIFIC_NAME: &str = "Analysis Error";
const FALLBACK_DESCRIPTION: &str = "There was an error analyzing your plant image. This could be due to image quality, \
                                    network issues, or service availability.";
const FALLBACK_SYMPTOMS: [&str; 1] = ["Unable to determine symptoms"];
const FALLBACK_PRECAUTIONS: [&str; 3] = [
    "Please try again with a clearer image",
    "Ensure you have a stable internet connection",
    "If the problem persists, try again later",
];

// =============================================================================
// TYPES
// =============================================================================

/// Any failure inside the analysis pipeline, before classification.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("image rejected: {0}")]
    Rejected(#[from] ImageRejected),
    #[error("image encoding failed: {0}")]
    Encoding(#[from] EncodingError),
    #[error("inference call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("inference response had no text content")]
    NoResponse,
    #[error("model output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model output failed validation: {0}")]
    Validation(#[from] ValidationError),
}

impl Classify for AnalysisError {
    fn known_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected(e) => e.known_code(),
            Self::Encoding(e) => e.known_code(),
            Self::Llm(e) => e.known_code(),
            Self::NoResponse => Some(ErrorCode::NoResponse),
            Self::Parse(_) => Some(ErrorCode::ParseError),
            Self::Validation(e) => e.known_code(),
        }
    }

    fn is_invalid_request(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_invalid_request())
    }

    fn details(&self) -> String {
        match self {
            Self::Llm(e) => e.details(),
            other => other.to_string(),
        }
    }
}

pub struct PlantAnalyzer {
    llm: Arc<dyn LlmChat>,
    settings: GenerationSettings,
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

impl PlantAnalyzer {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    /// Analyze a plant photo. Always returns a valid `Analysis`; on any
    /// failure that is the fallback record built by [`fallback_analysis`].
    pub async fn analyze(&self, image: &[u8], mime_type: &str) -> Analysis {
        match self.run(image, mime_type).await {
            Ok(draft) => {
                let analysis = draft.into_analysis();
                info!(
                    analysis_id = %analysis.id,
                    name = %analysis.name,
                    level = %analysis.toxicity.level,
                    "analysis: completed"
                );
                analysis
            }
            Err(err) => {
                let classified = classify(&err);
                warn!(code = %classified.code, details = %classified.details, "analysis: failed, returning fallback");
                fallback_analysis(&classified)
            }
        }
    }

    async fn run(&self, image: &[u8], mime_type: &str) -> Result<AnalysisDraft, AnalysisError> {
        info!(mime_type, size = image.len(), "analysis: request received");
        check_upload(image.len(), mime_type)?;
        let embedded = encode(image, mime_type)?;

        let messages = [Message::user_blocks(vec![
            ContentBlock::Text { text: ANALYSIS_USER_PROMPT.to_string() },
            ContentBlock::Image { image: embedded },
        ])];
        let request = ChatRequest {
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: ANALYSIS_SYSTEM_PROMPT,
            messages: &messages,
        };
        let response = self.llm.chat(&request).await?;
        info!(
            model = %response.model,
            stop_reason = %response.stop_reason,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "analysis: LLM response"
        );

        let text = response.first_text().ok_or(AnalysisError::NoResponse)?;
        let raw: Value = serde_json::from_str(extract_json_object(text))?;
        Ok(validate(&raw)?)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Slice out the first balanced `{...}` object in `text`, skipping braces
/// inside JSON strings. Text with no `{` is returned whole; an object that
/// never closes is returned from its opening brace to the end.
#[must_use]
pub fn extract_json_object(text: &str) -> &str {
    let Some(start) = text.find('{') else {
        return text;
    };
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &text[start..=start + offset];
                }
            }
            _ => {}
        }
    }
    &text[start..]
}

/// Labeled stand-in returned when the pipeline cannot produce an analysis.
#[must_use]
pub fn fallback_analysis(error: &ClassifiedError) -> Analysis {
    AnalysisDraft {
        name: FALLBACK_NAME.to_string(),
        scientific_name: FALLBACK_SCIENTIFIC_NAME.to_string(),
        description: FALLBACK_DESCRIPTION.to_string(),
        toxicity: Toxicity { toxic: true, level: ToxicityLevel::Moderate, warning: error.message.to_string() },
        symptoms: FALLBACK_SYMPTOMS.iter().map(ToString::to_string).collect(),
        precautions: FALLBACK_PRECAUTIONS.iter().map(ToString::to_string).collect(),
    }
    .into_analysis()
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
