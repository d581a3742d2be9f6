//! Subject identifiers and the face-sample file names derived from them.

use crate::error::EngineError;
use std::path::Path;

/// Check that `id` can be recovered from a sample file name.
///
/// Labels are read back as the part of the file name before the first `_`,
/// so identifiers must not contain one. Path separators and whitespace are
/// rejected as well.
pub fn validate_subject_id(id: &str) -> Result<&str, EngineError> {
    let bad = id.is_empty()
        || id.chars().any(|c| c == '_' || c == '/' || c == '\\' || c.is_whitespace());
    if bad {
        return Err(EngineError::InvalidSubject(id.to_string()));
    }
    Ok(id)
}

/// Display name as used inside a file name.
pub fn file_safe_name(name: &str) -> String {
    name.trim().replace(['/', '\\'], "-")
}

/// Label of a sample file: everything before the first `_`, or the file
/// stem when there is no underscore.
pub fn label_from_file_name(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    let label = match file_name.split_once('_') {
        Some((label, _)) => label,
        None => path.file_stem()?.to_str()?,
    };
    (!label.is_empty()).then_some(label)
}
