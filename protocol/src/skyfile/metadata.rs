//! Skyfile metadata: the JSON blob stored between the layout and the file.
//!
//! Only single-file skyfiles are supported. Anything that would need
//! subfile handling on the portal side is rejected before upload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SkyfileError;

/// The metadata written for a single uploaded file. Field names and order
/// match what portals produce, so the JSON is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyfileMetadata {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Length")]
    pub length: u64,
}

impl SkyfileMetadata {
    pub fn new(filename: impl Into<String>, length: u64) -> Self {
        Self {
            filename: filename.into(),
            length,
        }
    }

    /// Validate and serialize.
    pub fn to_json(&self) -> Result<Vec<u8>, SkyfileError> {
        let value = serde_json::to_value(self).map_err(|e| SkyfileError::Encoding(e.to_string()))?;
        validate_metadata(&value)?;
        serde_json::to_vec(self).map_err(|e| SkyfileError::Encoding(e.to_string()))
    }
}

/// Check that a skyfile path is a clean relative path.
pub fn validate_path(path: &str) -> Result<(), SkyfileError> {
    let invalid = |reason: &str| Err(SkyfileError::InvalidPath(format!("{:?}: {}", path, reason)));

    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.starts_with('/') {
        return invalid("path cannot start with /");
    }
    for element in path.split('/') {
        match element {
            "" => return invalid("path has an empty element"),
            "." | ".." => return invalid("path cannot contain . or .. elements"),
            _ => {}
        }
    }
    Ok(())
}

/// Validate untrusted skyfile metadata.
pub fn validate_metadata(metadata: &Value) -> Result<(), SkyfileError> {
    let obj = metadata
        .as_object()
        .ok_or_else(|| SkyfileError::InvalidMetadata("metadata is not an object".to_string()))?;

    let filename = obj
        .get("Filename")
        .ok_or_else(|| SkyfileError::InvalidMetadata("Filename does not exist".to_string()))?
        .as_str()
        .ok_or_else(|| SkyfileError::InvalidMetadata("Filename is not a string".to_string()))?;
    validate_path(filename)?;

    if obj.contains_key("Subfiles") {
        return Err(SkyfileError::Unsupported("Subfiles"));
    }
    if obj.contains_key("DefaultPath") {
        if obj.contains_key("DisableDefaultPath") {
            return Err(SkyfileError::InvalidMetadata(
                "cannot set both DefaultPath and DisableDefaultPath".to_string(),
            ));
        }
        return Err(SkyfileError::InvalidMetadata(
            "cannot set a DefaultPath without subfiles".to_string(),
        ));
    }
    if obj.contains_key("TryFiles") {
        return Err(SkyfileError::Unsupported("TryFiles"));
    }
    if obj.contains_key("ErrorPages") {
        return Err(SkyfileError::Unsupported("ErrorPages"));
    }
    Ok(())
}
