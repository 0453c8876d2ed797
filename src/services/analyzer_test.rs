use super::*;
use crate::image::MAX_IMAGE_BYTES;
use crate::llm::types::Content;
use crate::services::test_helpers::{MockLlm, empty_response, text_response};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

const POTHOS_REPLY: &str = r#"Here is the analysis you asked for:
{"name":"Pothos","scientificName":"Epipremnum aureum","toxicity":{"toxic":true,"level":"mild","warning":"Mildly toxic if ingested"},"description":"A trailing vine with heart-shaped leaves.","symptoms":["Oral irritation","Drooling"],"precautions":["Keep away from pets"]}
Let me know if you need anything else."#;

fn analyzer(mock: &Arc<MockLlm>) -> PlantAnalyzer {
    PlantAnalyzer::new(mock.clone(), GenerationSettings::analysis_defaults())
}

fn assert_fallback(analysis: &Analysis, code: ErrorCode) {
    assert_eq!(analysis.name, FALLBACK_NAME);
    assert_eq!(analysis.scientific_name, "Analysis Error");
    assert!(analysis.toxicity.toxic);
    assert_eq!(analysis.toxicity.level, ToxicityLevel::Moderate);
    assert_eq!(analysis.toxicity.warning, code.message());
    assert_eq!(analysis.symptoms, ["Unable to determine symptoms"]);
    assert_eq!(analysis.precautions.len(), 3);
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn prose_wrapped_reply_becomes_analysis() {
    let mock = Arc::new(MockLlm::replying_text(POTHOS_REPLY));
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;

    assert_eq!(analysis.name, "Pothos");
    assert_eq!(analysis.scientific_name, "Epipremnum aureum");
    assert_eq!(analysis.toxicity.level, ToxicityLevel::Mild);
    assert_eq!(analysis.symptoms, ["Oral irritation", "Drooling"]);
    assert!(analysis.follow_up_questions.is_empty());
    assert!(analysis.image_url.is_none());
    assert!(analysis.timestamp > 0);
}

#[tokio::test]
async fn reply_without_lists_yields_empty_lists() {
    let reply = r#"Here you go: {"name":"Pothos","scientificName":"Epipremnum aureum","toxicity":{"toxic":true,"level":"mild","warning":"Mildly toxic if ingested"},"description":"A common houseplant."}"#;
    let mock = Arc::new(MockLlm::replying_text(reply));
    let before = crate::plant::now_ms();
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;

    assert_eq!(analysis.name, "Pothos");
    assert_eq!(analysis.toxicity.level, ToxicityLevel::Mild);
    assert!(analysis.symptoms.is_empty());
    assert!(analysis.precautions.is_empty());
    assert!(!analysis.id.is_nil());
    assert!(analysis.timestamp >= before);
}

#[tokio::test]
async fn each_analysis_gets_a_distinct_id() {
    let mock = Arc::new(MockLlm::new(vec![Ok(text_response(POTHOS_REPLY)), Ok(text_response(POTHOS_REPLY))]));
    let analyzer = analyzer(&mock);
    let first = analyzer.analyze(PNG_BYTES, "image/png").await;
    let second = analyzer.analyze(PNG_BYTES, "image/png").await;
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn request_carries_prompt_image_and_bounds() {
    let mock = Arc::new(MockLlm::replying_text(POTHOS_REPLY));
    analyzer(&mock).analyze(PNG_BYTES, "image/png").await;

    let recorded = mock.recorded();
    assert_eq!(recorded.len(), 1);
    let request = &recorded[0];
    assert_eq!(request.max_tokens, 500);
    assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(request.system, ANALYSIS_SYSTEM_PROMPT);
    assert_eq!(request.messages.len(), 1);

    let Content::Blocks(blocks) = &request.messages[0].content else {
        panic!("expected structured content");
    };
    assert!(matches!(&blocks[0], ContentBlock::Text { text } if text.contains("toxicity information")));
    let ContentBlock::Image { image } = &blocks[1] else {
        panic!("expected image block");
    };
    assert_eq!(image.mime_type(), "image/png");
    assert!(image.as_data_uri().starts_with("data:image/png;base64,"));
}

// =============================================================================
// Failures become the fallback
// =============================================================================

#[tokio::test]
async fn network_failure_returns_api_error_fallback() {
    let mock = Arc::new(MockLlm::failing(LlmError::ApiRequest("connection reset".into())));
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;
    assert_fallback(&analysis, ErrorCode::ApiError);
}

#[tokio::test]
async fn invalid_request_marker_returns_model_error_fallback() {
    let body = r#"{"error":{"type":"invalid_request_error","message":"bad model"}}"#;
    let mock = Arc::new(MockLlm::failing(LlmError::ApiResponse { status: 400, body: body.into() }));
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;
    assert_fallback(&analysis, ErrorCode::ModelError);
}

#[tokio::test]
async fn unknown_level_returns_validation_fallback() {
    let reply = POTHOS_REPLY.replace(r#""level":"mild""#, r#""level":"lethal""#);
    let mock = Arc::new(MockLlm::replying_text(&reply));
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;
    assert_fallback(&analysis, ErrorCode::ValidationError);
}

#[tokio::test]
async fn non_json_reply_returns_parse_fallback() {
    let mock = Arc::new(MockLlm::replying_text("I cannot identify this plant."));
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;
    assert_fallback(&analysis, ErrorCode::ParseError);
}

#[tokio::test]
async fn empty_reply_returns_no_response_fallback() {
    let mock = Arc::new(MockLlm::new(vec![Ok(empty_response())]));
    let analysis = analyzer(&mock).analyze(PNG_BYTES, "image/png").await;
    assert_fallback(&analysis, ErrorCode::NoResponse);
}

#[tokio::test]
async fn unsupported_type_never_reaches_the_model() {
    let mock = Arc::new(MockLlm::replying_text(POTHOS_REPLY));
    let analysis = analyzer(&mock).analyze(b"GIF89a", "image/gif").await;
    assert_fallback(&analysis, ErrorCode::ValidationError);
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn oversized_image_never_reaches_the_model() {
    let mock = Arc::new(MockLlm::replying_text(POTHOS_REPLY));
    let big = vec![0u8; MAX_IMAGE_BYTES + 1];
    let analysis = analyzer(&mock).analyze(&big, "image/jpeg").await;
    assert_fallback(&analysis, ErrorCode::ValidationError);
    assert!(mock.recorded().is_empty());
}

#[test]
fn fallback_ids_are_fresh() {
    let err = ClassifiedError::new(ErrorCode::ApiError, "x");
    assert_ne!(fallback_analysis(&err).id, fallback_analysis(&err).id);
}

// =============================================================================
// JSON extraction
// =============================================================================

#[test]
fn extract_skips_surrounding_prose() {
    assert_eq!(extract_json_object("Sure! {\"a\": 1} Hope that helps."), "{\"a\": 1}");
}

#[test]
fn extract_handles_nesting_and_braces_in_strings() {
    let text = r#"x {"a": {"b": "}{"}, "c": "\"}"} trailing }"#;
    assert_eq!(extract_json_object(text), r#"{"a": {"b": "}{"}, "c": "\"}"}"#);
}

#[test]
fn extract_without_brace_returns_input() {
    assert_eq!(extract_json_object("no json here"), "no json here");
}

#[test]
fn extract_unbalanced_returns_tail() {
    assert_eq!(extract_json_object("lead {\"a\": {"), "{\"a\": {");
}

#[test]
fn parse_error_classifies_as_parse_error() {
    let err: AnalysisError = serde_json::from_str::<Value>("{").unwrap_err().into();
    assert_eq!(classify(&err).code, ErrorCode::ParseError);
}
