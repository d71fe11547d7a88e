use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tempfile::NamedTempFile;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    error::{AppError, Result},
    uploads::{self, StagedUpload, StoredUpload, UploadRequest},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub category: String,
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: String,
}

impl From<StoredUpload> for UploadResponse {
    fn from(stored: StoredUpload) -> Self {
        Self {
            id: stored.id,
            category: stored.category,
            filename: stored.filename,
            original_filename: stored.original_filename,
            content_type: stored.content_type,
            size: stored.size,
            uploaded_at: stored.uploaded_at.to_rfc3339(),
        }
    }
}

/// Accept one multipart upload for the given category.
///
/// Rule rejections come back as 422 with the outcome body `{valid, message}`
/// so the caller can attach the message verbatim to the rejected field.
/// Request-shape problems (no file field, hostile filename) are 400s.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(category): Path<String>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut staged: Option<(StagedUpload, NamedTempFile)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let filename = field
                .file_name()
                .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?
                .to_string();

            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let data = field.bytes().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            })?;

            let request = UploadRequest {
                filename: filename.clone(),
                content_type: content_type.clone(),
                size: data.len() as u64,
            };
            if let Err(errors) = request.validate() {
                return Err(AppError::BadRequest(first_message(&errors)));
            }

            // Stage the received bytes; the temp file is removed on drop
            // whether or not the upload is accepted.
            let staging = NamedTempFile::new_in(&state.config.uploads.staging_dir)?;
            tokio::fs::write(staging.path(), &data).await?;

            staged = Some((
                StagedUpload {
                    original_filename: filename,
                    content_type,
                    size: data.len() as u64,
                    path: staging.path().to_path_buf(),
                },
                staging,
            ));
            break;
        }
    }

    let Some((upload, _staging)) = staged else {
        return Err(AppError::BadRequest("No file found in request".to_string()));
    };

    let outcome = uploads::validate(&category, &upload)?;
    if !outcome.valid {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(outcome)).into_response());
    }

    let stored = state.store.store(&category, &upload).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from(stored))).into_response())
}

pub async fn serve_file(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Response> {
    let data = state
        .store
        .read(&category, &filename)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        content_type.as_ref().parse().unwrap_or_else(|_| {
            HeaderValue::from_static("application/octet-stream")
        }),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(data.len() as u64),
    );

    Ok((StatusCode::OK, headers, data).into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<StatusCode> {
    if state.store.remove(&category, &filename).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("File not found".to_string()))
    }
}

/// The compiled-in rule table, so admin forms can mirror the constraints
/// client-side before a byte is uploaded.
pub async fn list_categories() -> Result<Json<serde_json::Value>> {
    let mut entries: Vec<_> = uploads::all_rules().iter().collect();
    entries.sort_by_key(|(name, _)| **name);

    let mut categories = serde_json::Map::new();
    for (name, rule) in entries {
        categories.insert((*name).to_string(), serde_json::to_value(rule)?);
    }

    Ok(Json(serde_json::Value::Object(categories)))
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(_, field_errors)| field_errors.iter())
        .find_map(|error| error.message.as_ref().map(|message| message.to_string()))
        .unwrap_or_else(|| "Invalid upload request".to_string())
}
