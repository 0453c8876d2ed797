//! Conversation orchestrator — follow-up questions about one analysis.
//!
//! The prior analysis goes into the system instruction as grounding and the
//! question is the single user turn. Earlier follow-up turns are not
//! replayed.
//!
//! Errors are surfaced, not healed. The chat caller renders its own inline
//! error bubble, distinct from a real answer, so it needs to know the call
//! failed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{ClassifiedError, ErrorCode, classify};
use crate::llm::LlmChat;
use crate::llm::config::GenerationSettings;
use crate::llm::types::{ChatRequest, Message};
use crate::plant::{Analysis, ChatMessage};
use crate::services::validator::ValidationError;

/// Assistant text a chat caller shows when `ask` fails.
pub const FOLLOW_UP_FALLBACK_REPLY: &str =
    "I apologize, but I encountered an error processing your question. Please try again.";

pub struct ConversationService {
    llm: Arc<dyn LlmChat>,
    settings: GenerationSettings,
}

impl ConversationService {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    /// Answer `question` in the context of `analysis`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure: a blank question is
    /// `VALIDATION_ERROR`, an empty reply is `NO_RESPONSE`, and transport
    /// failures classify as `API_ERROR` or `MODEL_ERROR`.
    pub async fn ask(&self, analysis: &Analysis, question: &str) -> Result<ChatMessage, ClassifiedError> {
        if question.trim().is_empty() {
            return Err(classify(&ValidationError::new("question", "must not be blank")));
        }
        info!(analysis_id = %analysis.id, question_len = question.len(), "follow-up: request received");

        let system = context_prompt(analysis);
        let messages = [Message::user_text(question)];
        let request = ChatRequest {
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: &system,
            messages: &messages,
        };

        let response = self.llm.chat(&request).await.map_err(|e| {
            let classified = classify(&e);
            warn!(code = %classified.code, details = %classified.details, "follow-up: LLM call failed");
            classified
        })?;
        info!(
            model = %response.model,
            stop_reason = %response.stop_reason,
            output_tokens = response.output_tokens,
            "follow-up: LLM response"
        );

        let Some(text) = response.first_text().filter(|text| !text.trim().is_empty()) else {
            warn!(analysis_id = %analysis.id, "follow-up: empty response");
            return Err(ClassifiedError::new(ErrorCode::NoResponse, "follow-up response had no text content"));
        };
        Ok(ChatMessage::assistant(text))
    }
}

/// System instruction grounding the model in the prior analysis.
#[must_use]
pub fn context_prompt(analysis: &Analysis) -> String {
    format!(
        "You are a plant expert. Previous analysis of the plant:\n\
         Name: {}\n\
         Scientific Name: {}\n\
         Toxicity Level: {}\n\
         Description: {}\n\
         \n\
         Provide a clear, detailed answer focusing on plant safety and accurate information.",
        analysis.name, analysis.scientific_name, analysis.toxicity.level, analysis.description
    )
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
