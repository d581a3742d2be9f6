//! Browser-captured frames posted to the web surface.

use crate::error::EngineError;
use crate::subject::validate_subject_id;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Decode a base64 image (optionally a `data:` URL) and store it as
/// `{subject}_{YYYYmmddHHMMSSffffff}.jpg` in `data_dir`.
///
/// The bytes are written as received; no face detection runs here.
pub fn save_upload(
    data_dir: &Path,
    subject_id: &str,
    image_data: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, EngineError> {
    let subject_id = validate_subject_id(subject_id)?;
    let bytes = decode_image_data(image_data)?;

    std::fs::create_dir_all(data_dir).map_err(|e| EngineError::io(data_dir, e))?;
    let path = data_dir.join(format!("{subject_id}_{}.jpg", now.format("%Y%m%d%H%M%S%6f")));
    std::fs::write(&path, &bytes).map_err(|e| EngineError::io(&path, e))?;

    tracing::info!(subject_id, bytes = bytes.len(), path = %path.display(), "stored uploaded frame");
    Ok(path)
}

fn decode_image_data(image_data: &str) -> Result<Vec<u8>, EngineError> {
    let payload = match image_data.trim().split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        Some(_) => return Err(EngineError::MalformedUpload("unexpected ',' in image data".into())),
        None => image_data.trim(),
    };
    if payload.is_empty() {
        return Err(EngineError::MalformedUpload("image data is empty".into()));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| EngineError::MalformedUpload(format!("image data is not base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap() + chrono::Duration::microseconds(42)
    }

    #[test]
    fn test_data_url_is_decoded_and_named_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let data = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"\xff\xd8jpeg"));

        let path = save_upload(dir.path(), "s1", &data, at()).unwrap();

        assert_eq!(path, dir.path().join("s1_20261016093005000042.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\xff\xd8jpeg");
    }

    #[test]
    fn test_bare_base64_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(&dir.path().join("new"), "s2", &STANDARD.encode(b"abc"), at()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "data:image/jpeg;base64,", "not base64!!", "a,b"] {
            let err = save_upload(dir.path(), "s3", bad, at()).unwrap_err();
            assert!(matches!(err, EngineError::MalformedUpload(_)), "{bad:?}");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_bad_subject_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_upload(dir.path(), "../x", &STANDARD.encode(b"abc"), at()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSubject(_)));
    }
}
