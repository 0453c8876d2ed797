//! LLM types — provider-neutral request/response types and errors.
//!
//! Shared by the Anthropic and `OpenAI` clients. Requests carry text and
//! embedded images; responses are reduced to text blocks.

use serde_json::Value;

use crate::error::Classify;
use crate::image::EmbeddedImage;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the LLM provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The LLM provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The LLM provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl LlmError {
    /// `true` when the provider's error body says `error.type` is
    /// `invalid_request_error`. Both `OpenAI` and Anthropic use that shape.
    #[must_use]
    pub fn has_invalid_request_marker(&self) -> bool {
        let Self::ApiResponse { body, .. } = self else {
            return false;
        };
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|root| {
                root.get("error")
                    .and_then(|e| e.get("type"))
                    .and_then(Value::as_str)
                    .map(|kind| kind == "invalid_request_error")
            })
            .unwrap_or(false)
    }
}

impl Classify for LlmError {
    fn is_invalid_request(&self) -> bool {
        self.has_invalid_request_marker()
    }

    fn details(&self) -> String {
        match self {
            Self::ApiResponse { status, body } => format!("status {status}: {body}"),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// CONTENT BLOCKS
// =============================================================================

/// A structured content block in a message or API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// A plain text segment.
    Text { text: String },

    /// An inline image. Only ever sent, never received.
    Image { image: EmbeddedImage },
}

/// Message content — either plain text or structured blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A simple string payload.
    Text(String),
    /// A sequence of typed content blocks.
    Blocks(Vec<ContentBlock>),
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: Content,
}

impl Message {
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self { role: "user".into(), content: Content::Text(text.into()) }
    }

    #[must_use]
    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self { role: "user".into(), content: Content::Blocks(blocks) }
    }
}

/// One inference call: sampling bounds, system instruction, and turns.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: &'a str,
    pub messages: &'a [Message],
}

/// Response from an LLM chat call.
#[derive(Debug)]
pub struct ChatResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ChatResponse {
    /// Content of the first text block, if present and non-empty.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

// =============================================================================
// LLM CHAT TRAIT
// =============================================================================

/// Provider-neutral async trait for LLM chat. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// Send a chat request to the LLM provider.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is
    /// malformed.
    async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
