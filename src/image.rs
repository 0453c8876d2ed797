//! Image encoder — upload bytes to an embedded `data:` URI.
//!
//! DESIGN
//! ======
//! Two distinct failure kinds. `check_upload` enforces the MIME allow-list
//! and the size cap before any encoding is attempted and fails with
//! `ImageRejected`. `encode` itself only fails when the source cannot be
//! read or a pre-encoded input is malformed (`EncodingError`).
//!
//! Input that already starts with `data:` is passed through, so encoding
//! an encoded image yields the same URI.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Classify, ErrorCode};

/// MIME types accepted for analysis.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Maximum upload size in bytes (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

// =============================================================================
// ERRORS
// =============================================================================

/// Upload precondition failure. Classified as `VALIDATION_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageRejected {
    #[error("invalid image format {mime_type:?}; please use JPG, PNG, or WebP")]
    UnsupportedType { mime_type: String },

    #[error("image size too large ({size} bytes); maximum size is {max} bytes")]
    TooLarge { size: usize, max: usize },
}

impl Classify for ImageRejected {
    fn known_code(&self) -> Option<ErrorCode> {
        Some(ErrorCode::ValidationError)
    }
}

/// Local image preparation failure.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("image read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
}

impl Classify for EncodingError {}

// =============================================================================
// EMBEDDED IMAGE
// =============================================================================

/// Self-describing inline image: MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    mime_type: String,
    data: String,
}

impl EmbeddedImage {
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload without the `data:` prefix.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    #[must_use]
    pub fn as_data_uri(&self) -> String {
        format!("{DATA_URI_SCHEME}{}{BASE64_MARKER}{}", self.mime_type, self.data)
    }

    fn parse_data_uri(uri: &str) -> Result<Self, EncodingError> {
        let Some(rest) = uri.strip_prefix(DATA_URI_SCHEME) else {
            return Err(EncodingError::MalformedDataUri("missing data: scheme".into()));
        };
        let Some((mime_type, data)) = rest.split_once(BASE64_MARKER) else {
            return Err(EncodingError::MalformedDataUri("expected a ;base64, payload".into()));
        };
        if mime_type.is_empty() || data.is_empty() {
            return Err(EncodingError::MalformedDataUri("empty MIME type or payload".into()));
        }
        Ok(Self { mime_type: mime_type.to_string(), data: data.to_string() })
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Enforce the MIME allow-list and size cap. Runs before `encode`.
///
/// # Errors
///
/// Returns `ImageRejected` when the type is not accepted or the image is
/// larger than [`MAX_IMAGE_BYTES`].
pub fn check_upload(size: usize, mime_type: &str) -> Result<(), ImageRejected> {
    if !ACCEPTED_MIME_TYPES.contains(&mime_type) {
        return Err(ImageRejected::UnsupportedType { mime_type: mime_type.to_string() });
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ImageRejected::TooLarge { size, max: MAX_IMAGE_BYTES });
    }
    Ok(())
}

/// Encode raw bytes as an embedded image reference.
///
/// # Errors
///
/// Returns `EncodingError::MalformedDataUri` when the input claims to be a
/// `data:` URI but is not valid UTF-8 or lacks a base64 payload.
pub fn encode(bytes: &[u8], mime_type: &str) -> Result<EmbeddedImage, EncodingError> {
    if bytes.starts_with(DATA_URI_SCHEME.as_bytes()) {
        let uri = std::str::from_utf8(bytes).map_err(|e| EncodingError::MalformedDataUri(e.to_string()))?;
        return EmbeddedImage::parse_data_uri(uri);
    }
    Ok(EmbeddedImage { mime_type: mime_type.to_string(), data: BASE64.encode(bytes) })
}

/// Read an image file from disk.
///
/// # Errors
///
/// Returns `EncodingError::Read` when the file cannot be read.
pub fn read_image(path: &Path) -> Result<Vec<u8>, EncodingError> {
    Ok(std::fs::read(path)?)
}

/// Infer an accepted MIME type from a file extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "image_test.rs"]
mod tests;
