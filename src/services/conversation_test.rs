use super::*;
use crate::llm::types::{Content, LlmError};
use crate::plant::Role;
use crate::services::test_helpers::{MockLlm, dummy_analysis, empty_response};

fn service(mock: &Arc<MockLlm>) -> ConversationService {
    ConversationService::new(mock.clone(), GenerationSettings::follow_up_defaults())
}

#[tokio::test]
async fn answer_becomes_assistant_message() {
    let mock = Arc::new(MockLlm::replying_text("Yes, keep it out of reach of cats."));
    let analysis = dummy_analysis("Pothos");

    let reply = service(&mock).ask(&analysis, "Is it safe for cats?").await.unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Yes, keep it out of reach of cats.");
    assert!(reply.timestamp > 0);
}

#[tokio::test]
async fn request_grounds_the_model_in_the_analysis() {
    let mock = Arc::new(MockLlm::replying_text("ok"));
    let analysis = dummy_analysis("Pothos");
    service(&mock).ask(&analysis, "Is it safe for cats?").await.unwrap();

    let recorded = mock.recorded();
    let request = &recorded[0];
    assert!(request.system.starts_with("You are a plant expert."));
    assert!(request.system.contains("Name: Pothos"));
    assert!(request.system.contains("Scientific Name: Epipremnum aureum"));
    assert!(request.system.contains("Toxicity Level: mild"));
    assert!(request.system.contains("Description: A common houseplant."));
    assert_eq!(request.max_tokens, 500);
    assert!((request.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(request.messages, [Message::user_text("Is it safe for cats?")]);
    assert!(matches!(request.messages[0].content, Content::Text(_)));
}

#[tokio::test]
async fn prior_turns_are_not_replayed() {
    let mock = Arc::new(MockLlm::replying_text("ok"));
    let mut analysis = dummy_analysis("Pothos");
    analysis.follow_up_questions.push(ChatMessage::user("earlier question"));
    analysis.follow_up_questions.push(ChatMessage::assistant("earlier answer"));

    service(&mock).ask(&analysis, "new question").await.unwrap();
    let recorded = mock.recorded();
    assert_eq!(recorded[0].messages.len(), 1);
    assert!(!recorded[0].system.contains("earlier"));
}

#[tokio::test]
async fn transport_failure_is_surfaced_as_api_error() {
    let mock = Arc::new(MockLlm::failing(LlmError::ApiRequest("timed out".into())));
    let err = service(&mock).ask(&dummy_analysis("Pothos"), "Is it safe?").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ApiError);
    assert_eq!(err.message, "Error communicating with OpenAI API");
    assert!(err.details.contains("timed out"));
}

#[tokio::test]
async fn invalid_request_is_surfaced_as_model_error() {
    let body = r#"{"error":{"type":"invalid_request_error"}}"#;
    let mock = Arc::new(MockLlm::failing(LlmError::ApiResponse { status: 400, body: body.into() }));
    let err = service(&mock).ask(&dummy_analysis("Pothos"), "Is it safe?").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ModelError);
}

#[tokio::test]
async fn empty_reply_is_no_response() {
    let mock = Arc::new(MockLlm::new(vec![Ok(empty_response())]));
    let err = service(&mock).ask(&dummy_analysis("Pothos"), "Is it safe?").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NoResponse);
}

#[tokio::test]
async fn whitespace_reply_is_no_response() {
    let mock = Arc::new(MockLlm::replying_text(" \n\t"));
    let err = service(&mock).ask(&dummy_analysis("Pothos"), "Is it safe?").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NoResponse);
}

#[tokio::test]
async fn blank_question_is_rejected_without_a_call() {
    let mock = Arc::new(MockLlm::replying_text("ok"));
    let err = service(&mock).ask(&dummy_analysis("Pothos"), "   ").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(mock.recorded().is_empty());
}

#[test]
fn context_prompt_uses_lowercase_level() {
    let prompt = context_prompt(&dummy_analysis("Pothos"));
    assert!(prompt.ends_with("Provide a clear, detailed answer focusing on plant safety and accurate information."));
    assert!(prompt.contains("\n\nProvide"));
}
