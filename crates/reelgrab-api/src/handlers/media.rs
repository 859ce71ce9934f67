//! Stored media serving and deletion.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use reelgrab_core::constants::MEDIA_CONTENT_TYPE;
use reelgrab_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/media/{filename}",
    tag = "media",
    params(
        ("filename" = String, Path, description = "Stored media filename")
    ),
    responses(
        (status = 200, description = "Media file stream", content_type = "video/mp4"),
        (status = 400, description = "Invalid filename", body = ErrorResponse),
        (status = 404, description = "File not found or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, HttpAppError> {
    let media = state.storage.metadata(&filename).await?;
    let stream = state.storage.download_stream(&filename).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, MEDIA_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, media.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", media.filename),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build media response");
            HttpAppError(AppError::Internal(e.to_string()))
        })
}

#[utoipa::path(
    delete,
    path = "/media/{filename}",
    tag = "media",
    params(
        ("filename" = String, Path, description = "Stored media filename")
    ),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 400, description = "Invalid filename", body = ErrorResponse),
        (status = 404, description = "File not found or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.storage.delete(&filename).await? {
        return Err(AppError::NotFound(format!("Media not found: {}", filename)).into());
    }

    tracing::info!(filename = %filename, "Media deleted");
    Ok(StatusCode::NO_CONTENT)
}
