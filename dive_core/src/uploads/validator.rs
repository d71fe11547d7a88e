//! Category admissibility checks for staged uploads.
//!
//! One call decides whether a staged file may be stored under a category.
//! Checks run in a fixed order and stop at the first failure, so a caller
//! always sees the single highest-priority problem: category existence,
//! then extension/MIME, then magic bytes, then size, then image dimensions.

use std::path::Path;

use image::ImageReader;
use mime::Mime;
use serde::Serialize;
use thiserror::Error;

use super::category::{self, CategoryRule};
use super::models::StagedUpload;
use super::sniff;
use crate::error::Result;

/// Why a staged upload was turned away. The display strings are the exact
/// messages surfaced to the end user, attached verbatim to the rejected
/// field by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadRejection {
    #[error("Invalid file category: {0}")]
    UnknownCategory(String),

    #[error("File type not allowed. Allowed types: {allowed}")]
    TypeNotAllowed { allowed: String },

    #[error("File type does not match file content.")]
    ContentMismatch,

    #[error("File must be less than {max_mb}MB")]
    TooLarge { max_mb: f64 },

    #[error("Unable to read image dimensions.")]
    UnreadableImage,

    #[error("Image must be at least {min_width}x{min_height} pixels")]
    BelowMinDimensions { min_width: u32, min_height: u32 },
}

/// Pass/fail plus at most one message, serialized as `{valid, message}`.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn pass() -> Self {
        Self { valid: true, message: None }
    }

    pub fn reject(rejection: &UploadRejection) -> Self {
        Self {
            valid: false,
            message: Some(rejection.to_string()),
        }
    }
}

/// Decide admissibility of one staged upload for one declared category.
///
/// Rejections are normal return values. Only OS-level failures opening or
/// reading the staged file surface as errors; the caller maps those to an
/// internal fault, not to a user message.
pub fn validate(category: &str, upload: &StagedUpload) -> Result<Outcome> {
    match check(category, upload)? {
        None => Ok(Outcome::pass()),
        Some(rejection) => {
            tracing::debug!(
                category = %category,
                filename = %upload.original_filename,
                rejection = %rejection,
                "upload rejected"
            );
            Ok(Outcome::reject(&rejection))
        }
    }
}

fn check(category: &str, upload: &StagedUpload) -> Result<Option<UploadRejection>> {
    let rule = match category::rule_for(category) {
        Some(rule) => rule,
        None => return Ok(Some(UploadRejection::UnknownCategory(category.to_string()))),
    };

    // The allowed extensions this upload claims to be, by filename or by
    // declared MIME type. Empty means the type is not allowed at all; the
    // file content is never read in that case.
    let claimed = claimed_extensions(rule, upload);
    if claimed.is_empty() {
        return Ok(Some(UploadRejection::TypeNotAllowed {
            allowed: rule.allowed_list(),
        }));
    }

    // Sniffing is authoritative: the header must carry the signature of an
    // extension the claim matched, or the upload is spoofed/mislabeled.
    let header = sniff::read_header(&upload.path)?;
    if !claimed.iter().any(|ext| sniff::matches_extension(&header, ext)) {
        return Ok(Some(UploadRejection::ContentMismatch));
    }

    // Size equal to the limit is accepted; only strictly greater fails.
    if upload.size > rule.max_bytes {
        return Ok(Some(UploadRejection::TooLarge {
            max_mb: rule.max_megabytes(),
        }));
    }

    if let Some((min_width, min_height)) = rule.min_dimensions {
        let (width, height) = match probe_dimensions(&upload.path)? {
            Some(dimensions) => dimensions,
            None => return Ok(Some(UploadRejection::UnreadableImage)),
        };
        if width < min_width || height < min_height {
            return Ok(Some(UploadRejection::BelowMinDimensions { min_width, min_height }));
        }
    }

    Ok(None)
}

/// Allowed extensions consistent with the upload's claim: the claimed
/// extension itself, plus any allowed extension whose registered MIME type
/// equals the declared content type.
fn claimed_extensions(rule: &CategoryRule, upload: &StagedUpload) -> Vec<&'static str> {
    let claimed_ext = upload.extension();
    let claimed_mime: Option<Mime> = upload.content_type.parse().ok();

    rule.extensions
        .iter()
        .copied()
        .filter(|ext| {
            if claimed_ext.as_deref() == Some(*ext) {
                return true;
            }
            claimed_mime.as_ref().is_some_and(|mime| {
                mime_guess::from_ext(ext)
                    .iter()
                    .any(|guessed| guessed.essence_str() == mime.essence_str())
            })
        })
        .collect()
}

/// Pixel dimensions from the image header, or `None` when the file cannot be
/// decoded as an image. Decode failure on a correctly signed file is still a
/// rejection, not an internal error.
fn probe_dimensions(path: &Path) -> Result<Option<(u32, u32)>> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    match reader.into_dimensions() {
        Ok(dimensions) => Ok(Some(dimensions)),
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "failed to read image dimensions");
            Ok(None)
        }
    }
}
