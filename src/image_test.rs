use super::*;
use crate::error::classify;

// =============================================================================
// check_upload
// =============================================================================

#[test]
fn check_upload_accepts_allowed_types() {
    for mime in ACCEPTED_MIME_TYPES {
        assert!(check_upload(1024, mime).is_ok(), "{mime} should be accepted");
    }
}

#[test]
fn check_upload_rejects_other_types() {
    let err = check_upload(10, "image/gif").unwrap_err();
    assert_eq!(err, ImageRejected::UnsupportedType { mime_type: "image/gif".into() });
    assert!(check_upload(10, "IMAGE/PNG").is_err());
}

#[test]
fn check_upload_enforces_size_cap() {
    assert!(check_upload(MAX_IMAGE_BYTES, "image/png").is_ok());
    let err = check_upload(MAX_IMAGE_BYTES + 1, "image/png").unwrap_err();
    assert_eq!(err, ImageRejected::TooLarge { size: MAX_IMAGE_BYTES + 1, max: MAX_IMAGE_BYTES });
}

#[test]
fn rejected_upload_classifies_as_validation_error() {
    let err = check_upload(10, "text/plain").unwrap_err();
    assert_eq!(classify(&err).code, ErrorCode::ValidationError);
}

// =============================================================================
// encode
// =============================================================================

#[test]
fn encode_raw_bytes_builds_data_uri() {
    let image = encode(b"hello", "image/png").unwrap();
    assert_eq!(image.mime_type(), "image/png");
    assert_eq!(image.data(), "aGVsbG8=");
    assert_eq!(image.as_data_uri(), "data:image/png;base64,aGVsbG8=");
}

#[test]
fn encode_passes_through_existing_data_uri() {
    let uri = "data:image/webp;base64,UklGRg==";
    let image = encode(uri.as_bytes(), "image/jpeg").unwrap();
    assert_eq!(image.mime_type(), "image/webp");
    assert_eq!(image.as_data_uri(), uri);
}

#[test]
fn encode_is_idempotent() {
    let once = encode(&[0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg").unwrap();
    let twice = encode(once.as_data_uri().as_bytes(), "image/jpeg").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn encode_rejects_data_uri_without_base64_payload() {
    let err = encode(b"data:image/png,rawpixels", "image/png").unwrap_err();
    assert!(matches!(err, EncodingError::MalformedDataUri(_)));
}

#[test]
fn encoding_error_classifies_as_api_error() {
    let err = encode(b"data:;base64,", "image/png").unwrap_err();
    assert_eq!(classify(&err).code, ErrorCode::ApiError);
}

// =============================================================================
// read_image / mime_for_path
// =============================================================================

#[test]
fn read_image_missing_file_is_encoding_error() {
    let err = read_image(Path::new("/definitely/not/here.png")).unwrap_err();
    assert!(matches!(err, EncodingError::Read(_)));
}

#[test]
fn read_image_returns_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaf.png");
    std::fs::write(&path, [1u8, 2, 3]).unwrap();
    assert_eq!(read_image(&path).unwrap(), vec![1, 2, 3]);
}

#[test]
fn mime_for_path_maps_known_extensions() {
    assert_eq!(mime_for_path(Path::new("a.JPG")), Some("image/jpeg"));
    assert_eq!(mime_for_path(Path::new("a.jpeg")), Some("image/jpeg"));
    assert_eq!(mime_for_path(Path::new("a.png")), Some("image/png"));
    assert_eq!(mime_for_path(Path::new("a.webp")), Some("image/webp"));
    assert_eq!(mime_for_path(Path::new("a.gif")), None);
    assert_eq!(mime_for_path(Path::new("noext")), None);
}
