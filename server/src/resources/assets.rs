//! Asset Uploads
//!
//! Files are uploaded to the platform as permanent media; a display record
//! is kept in the document store.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument};

use super::{insert_model, list_class};
use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Asset, ASSET_CLASS};
use crate::store::Document;
use crate::util::format_file_size;
use crate::wechat::client::{MaterialUpload, MediaKind};

/// File extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg", "gif"];

const ASSET_SCHEMA: &str =
    "multipart form with fields: file, title, introduction, media_type (image|voice|video|thumb)";

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
}

/// Fields collected from the multipart form.
#[derive(Default)]
struct AssetForm {
    file: Option<(String, Bytes)>,
    title: Option<String>,
    introduction: Option<String>,
    media_type: Option<String>,
}

fn sanitize_filename(filename: &str) -> String {
    // Extract just the filename part (no directory components)
    let name = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    // Keep alphanumeric, dots, dashes, underscores
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .take(255)
        .collect()
}

/// Whether `filename` has an allowed extension (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
}

fn field_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(e.body_text())
}

/// GET /api/assets
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(list_class(state.store.as_ref(), ASSET_CLASS).await?))
}

/// POST /api/assets
///
/// Expects multipart form with:
/// - `file`: The file data
/// - `title`, `introduction`: Shown alongside the media
/// - `media_type`: Platform media type (image, voice, video, thumb)
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let max_size = state.config.max_upload_size;
    let mut form = AssetForm::default();

    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(field_error)?;

                if data.len() > max_size {
                    return Err(ApiError::TooLarge {
                        max: format_file_size(max_size),
                    });
                }

                form.file = Some((filename, data));
            }
            "title" => form.title = Some(field.text().await.map_err(field_error)?),
            "introduction" => form.introduction = Some(field.text().await.map_err(field_error)?),
            "media_type" => form.media_type = Some(field.text().await.map_err(field_error)?),
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let (filename, data) = form
        .file
        .ok_or_else(|| ApiError::BadRequest("No file part".to_string()))?;
    if filename.trim().is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }

    let safe_filename = sanitize_filename(&filename);
    if !allowed_file(&safe_filename) {
        return Err(ApiError::BadRequest(format!(
            "File type not allowed (allowed: {})",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let (Some(title), Some(introduction), Some(media_type)) =
        (form.title, form.introduction, form.media_type)
    else {
        return Err(ApiError::Malformed {
            schema: ASSET_SCHEMA,
        });
    };
    let kind = MediaKind::parse(&media_type).ok_or(ApiError::Malformed {
        schema: ASSET_SCHEMA,
    })?;

    let content_type = mime_guess::from_path(&safe_filename)
        .first_or_octet_stream()
        .to_string();

    let uploaded = state
        .platform
        .upload_material(MaterialUpload {
            kind,
            filename: safe_filename.clone(),
            content_type,
            data,
            title: title.clone(),
            introduction: introduction.clone(),
        })
        .await?;

    let asset = Asset {
        title,
        introduction,
        media_type: kind.as_str().to_string(),
        filename: safe_filename,
        media_id: uploaded.media_id,
        url: uploaded.url,
    };
    let doc = insert_model(state.store.as_ref(), ASSET_CLASS, &asset).await?;
    info!(object_id = %doc.object_id, media_id = %asset.media_id, "Asset uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File successfully uploaded",
        }),
    ))
}
