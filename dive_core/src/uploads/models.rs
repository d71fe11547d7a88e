//! Upload data models and request hygiene checks.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static! {
    // Control characters, path separators, and null bytes have no business in
    // an uploaded filename, whatever the category rules say about its type.
    static ref FILENAME_FORBIDDEN: Regex = Regex::new(r#"[/\\\x00-\x1f]"#).unwrap();
}

/// A fully received upload, staged on local disk and awaiting validation.
///
/// The surrounding handler owns the staged file; this struct only describes
/// it. `size` is the byte count of the received body, `path` points at the
/// staged copy.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub path: PathBuf,
}

impl StagedUpload {
    /// Lowercased extension of the claimed filename, if it has one.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

/// Metadata hygiene for an incoming upload, checked before the category
/// rules run. These are request-shape problems (absurd filenames, empty
/// bodies), not admissibility decisions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadRequest {
    #[validate(length(min = 1, max = 255, message = "Filename must be between 1 and 255 characters"))]
    #[validate(custom(function = "validate_upload_filename", message = "Filename contains invalid characters"))]
    pub filename: String,

    #[validate(length(min = 1, max = 100, message = "Content type is required and must not exceed 100 characters"))]
    pub content_type: String,

    #[validate(range(min = 1, message = "File cannot be empty"))]
    pub size: u64,
}

pub fn validate_upload_filename(filename: &str) -> Result<(), ValidationError> {
    if FILENAME_FORBIDDEN.is_match(filename) {
        return Err(ValidationError::new("forbidden_filename_characters"));
    }
    Ok(())
}

/// An accepted upload persisted under the storage root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUpload {
    pub id: Uuid,
    pub category: String,
    /// Generated name on disk, `{uuid}.{ext}`.
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(filename: &str) -> UploadRequest {
        UploadRequest {
            filename: filename.to_string(),
            content_type: "image/jpeg".to_string(),
            size: 1024,
        }
    }

    #[test]
    fn plain_filenames_pass() {
        assert!(request("reef-trip.jpg").validate().is_ok());
        assert!(request("open water cert 2025.pdf").validate().is_ok());
    }

    #[test]
    fn path_separators_are_rejected() {
        assert!(request("../../etc/passwd").validate().is_err());
        assert!(request("photos\\me.jpg").validate().is_err());
        assert!(request("null\0byte.png").validate().is_err());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let mut req = request("photo.jpg");
        req.size = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn overlong_filename_is_rejected() {
        let name = format!("{}.jpg", "a".repeat(300));
        assert!(request(&name).validate().is_err());
    }

    #[test]
    fn extension_is_lowercased() {
        let staged = StagedUpload {
            original_filename: "DSC_0042.JPG".to_string(),
            content_type: "image/jpeg".to_string(),
            size: 1,
            path: PathBuf::from("/tmp/staged"),
        };
        assert_eq!(staged.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn missing_extension_is_none() {
        let staged = StagedUpload {
            original_filename: "noextension".to_string(),
            content_type: "application/pdf".to_string(),
            size: 1,
            path: PathBuf::from("/tmp/staged"),
        };
        assert!(staged.extension().is_none());
    }
}
