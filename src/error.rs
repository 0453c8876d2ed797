//! Error classifier — every failure reduced to one of five stable codes.
//!
//! DESIGN
//! ======
//! Error types opt in through the `Classify` trait. An error may declare a
//! code it already carries, or flag that the upstream service rejected the
//! request as invalid. `classify` resolves in that order and falls back to
//! `API_ERROR`, so it is total over anything that implements the trait,
//! including plain strings.
//!
//! Each code maps to one fixed user-facing message. `details` keeps the
//! original cause for logs and is never shown to the end user.

use std::fmt;

use serde::Serialize;

// =============================================================================
// CODES
// =============================================================================

/// Closed taxonomy of classified failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Generic transport or service failure.
    ApiError,
    /// Upstream rejected the request shape or content.
    ModelError,
    /// Decoded payload failed structural checks.
    ValidationError,
    /// Service returned no usable content.
    NoResponse,
    /// Returned text was not decodable as JSON.
    ParseError,
}

impl ErrorCode {
    pub const ALL: [Self; 5] = [Self::ApiError, Self::ModelError, Self::ValidationError, Self::NoResponse, Self::ParseError];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiError => "API_ERROR",
            Self::ModelError => "MODEL_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NoResponse => "NO_RESPONSE",
            Self::ParseError => "PARSE_ERROR",
        }
    }

    /// The one user-presentable message for this code.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::ApiError => "Error communicating with OpenAI API",
            Self::ModelError => "Error with AI model configuration",
            Self::ValidationError => "Invalid response format from AI model",
            Self::NoResponse => "No response received from AI model",
            Self::ParseError => "Failed to parse AI model response",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CLASSIFIED ERROR
// =============================================================================

/// A failure reduced to a stable code plus its fixed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ClassifiedError {
    pub code: ErrorCode,
    pub message: &'static str,
    /// Original cause, for diagnostic logging only.
    #[serde(skip)]
    pub details: String,
}

impl ClassifiedError {
    #[must_use]
    pub fn new(code: ErrorCode, details: impl Into<String>) -> Self {
        Self { code, message: code.message(), details: details.into() }
    }
}

// =============================================================================
// CLASSIFY
// =============================================================================

/// Hooks an error type into `classify`. Defaults classify as `API_ERROR`.
pub trait Classify: fmt::Display {
    /// A code this error already carries.
    fn known_code(&self) -> Option<ErrorCode> {
        None
    }

    /// `true` when the upstream service flagged the request as invalid.
    fn is_invalid_request(&self) -> bool {
        false
    }

    fn details(&self) -> String {
        self.to_string()
    }
}

/// Map any classifiable failure onto exactly one code.
///
/// Known codes pass through unchanged, then the invalid-request marker
/// selects `MODEL_ERROR`, and everything else is `API_ERROR`.
pub fn classify<E: Classify + ?Sized>(error: &E) -> ClassifiedError {
    let code = match error.known_code() {
        Some(code) => code,
        None if error.is_invalid_request() => ErrorCode::ModelError,
        None => ErrorCode::ApiError,
    };
    ClassifiedError::new(code, error.details())
}

impl Classify for ClassifiedError {
    fn known_code(&self) -> Option<ErrorCode> {
        Some(self.code)
    }

    fn details(&self) -> String {
        self.details.clone()
    }
}

impl Classify for str {}

impl Classify for String {}

/// A caller's timeout race expiring counts as the service never answering.
impl Classify for tokio::time::error::Elapsed {
    fn known_code(&self) -> Option<ErrorCode> {
        Some(ErrorCode::NoResponse)
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
