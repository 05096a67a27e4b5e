use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::photo::PhotoResponse;
use crate::services::photo::PhotoUpload;
use crate::state::AppState;

/// Room for multipart framing on top of the photo itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn photo_upload_body_limit(max_photo_size: u64) -> DefaultBodyLimit {
    let limit = max_photo_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/listings/{id}/photo",
    tag = "Photos",
    operation_id = "uploadPhoto",
    summary = "Upload the listing photo",
    description = "The `file` multipart field is required. A new upload replaces the current \
        photo; the previous bytes stay in the blob store. Nothing is stored for an unknown \
        listing.",
    params(("id" = String, Path, description = "Listing ID")),
    request_body(content_type = "multipart/form-data", description = "Photo file in field `file`"),
    responses(
        (status = 201, description = "Photo stored and linked", body = PhotoResponse),
        (status = 400, description = "Missing file, bad filename or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Photo stored but not linked, retry (DEPENDENCY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_photo_size;
    let mut upload: Option<PhotoUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let content_type = field.content_type().map(|s| s.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (data.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "Photo exceeds maximum size of {max_size} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        upload = Some(PhotoUpload {
            filename,
            content_type,
            data,
        });
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let photo = state.coordinator().upload_photo(&id, upload).await?;

    Ok((StatusCode::CREATED, Json(PhotoResponse::from(photo))))
}

#[utoipa::path(
    get,
    path = "/listings/{id}/photo",
    tag = "Photos",
    operation_id = "downloadPhoto",
    summary = "Download the listing photo",
    description = "Streams the current photo with its stored content type. Supports ETag-based \
        caching via If-None-Match.",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "Listing not found or has no photo (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Blob store unavailable (DEPENDENCY_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let download = state.coordinator().download_photo(&id).await?;
    let photo = &download.photo;

    let etag_value = format!("\"{}\"", photo.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &photo.content_type)
        .header(header::CONTENT_LENGTH, photo.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&photo.filename),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(download.reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

/// `inline` disposition with an ASCII fallback name and an RFC 5987 `filename*`.
fn content_disposition_value(filename: &str) -> String {
    let ascii_name: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_name.is_empty() {
        "photo".to_string()
    } else {
        ascii_name
    };

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
