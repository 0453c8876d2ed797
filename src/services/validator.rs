//! Result validator — untyped model JSON to a typed `AnalysisDraft`.
//!
//! DESIGN
//! ======
//! Scalar fields are load-bearing and hard-fail: the first bad field ends
//! validation with a `ValidationError` naming it. `symptoms` and
//! `precautions` are supplementary and coerce silently: a missing or
//! non-array value becomes empty, and non-string or empty elements are
//! dropped. Keep the two strategies separate.
//!
//! `toxicity.level` is matched exactly against the four levels. No case
//! folding, no trimming.
//!
//! Validation reads its input and builds a new draft. It never mutates.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Classify, ErrorCode};
use crate::plant::{AnalysisDraft, Toxicity, ToxicityLevel};

/// A structural check failed. `field` is a dotted path such as
/// `toxicity.level`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing or invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl Classify for ValidationError {
    fn known_code(&self) -> Option<ErrorCode> {
        Some(ErrorCode::ValidationError)
    }
}

/// Project a decoded payload onto the `Analysis` shape.
///
/// # Errors
///
/// Returns a `ValidationError` for the first required field that is
/// missing, mistyped, or empty, or for an unrecognized toxicity level.
pub fn validate(raw: &Value) -> Result<AnalysisDraft, ValidationError> {
    let Some(analysis) = raw.as_object() else {
        debug!("validator: payload is not an object");
        return Err(ValidationError::new("analysis", "expected a JSON object"));
    };

    let name = required_text(analysis, "name", "name")?;
    let scientific_name = required_text(analysis, "scientificName", "scientificName")?;
    let description = required_text(analysis, "description", "description")?;

    let Some(toxicity) = analysis.get("toxicity").and_then(Value::as_object) else {
        return Err(ValidationError::new("toxicity", "expected an object"));
    };
    let Some(toxic) = toxicity.get("toxic").and_then(Value::as_bool) else {
        return Err(ValidationError::new("toxicity.toxic", "expected a boolean"));
    };
    let Some(level) = toxicity
        .get("level")
        .and_then(Value::as_str)
        .and_then(|value| value.parse::<ToxicityLevel>().ok())
    else {
        return Err(ValidationError::new("toxicity.level", "expected one of none, mild, moderate, severe"));
    };
    let warning = required_text(toxicity, "warning", "toxicity.warning")?;

    let symptoms = text_list(analysis.get("symptoms"));
    let precautions = text_list(analysis.get("precautions"));

    debug!(%level, symptoms = symptoms.len(), precautions = precautions.len(), "validator: payload accepted");
    Ok(AnalysisDraft {
        name,
        scientific_name,
        description,
        toxicity: Toxicity { toxic, level, warning },
        symptoms,
        precautions,
    })
}

fn required_text(object: &Map<String, Value>, key: &str, field: &'static str) -> Result<String, ValidationError> {
    match object.get(key).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        Some(_) => Err(ValidationError::new(field, "must not be empty")),
        None => Err(ValidationError::new(field, "expected text")),
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
