//! Download route: resolve a post URL and hand back the media.
//!
//! Domain failures (unsupported link, exhausted providers, failed acquisition)
//! are reported in a 200 body with `success: false`. Only a malformed request
//! body produces a non-2xx status.

use crate::error::{log_error, ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use reelgrab_core::{AppError, ErrorMetadata};
use reelgrab_services::{DownloadOutcome, PipelineError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// TikTok or Instagram post URL. A missing field is treated as empty.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSuccess {
    pub success: bool,
    /// Direct media URL returned by the provider
    pub video_url: String,
    /// Where the locally stored copy is served; absent when acquisition is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub title: String,
    pub provider: String,
    pub attempted_providers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFailure {
    pub success: bool,
    pub error: String,
    /// Error taxonomy name, e.g. `ResolutionExhausted`
    pub code: String,
    /// Direct media URL to try when the local download failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_providers: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DownloadResponse {
    Success(DownloadSuccess),
    Failure(DownloadFailure),
}

impl From<DownloadOutcome> for DownloadResponse {
    fn from(outcome: DownloadOutcome) -> Self {
        DownloadResponse::Success(DownloadSuccess {
            success: true,
            video_url: outcome.media_url,
            download_url: outcome.download_url,
            title: outcome.title,
            provider: outcome.provider,
            attempted_providers: outcome.attempted,
        })
    }
}

impl From<PipelineError> for DownloadResponse {
    fn from(err: PipelineError) -> Self {
        let alternative = err.alternative().map(String::from);
        let attempted = err.attempted().to_vec();
        let app_error = AppError::from(err);
        log_error(&app_error);

        DownloadResponse::Failure(DownloadFailure {
            success: false,
            error: app_error.client_message(),
            code: app_error.error_type().to_string(),
            alternative,
            attempted_providers: (!attempted.is_empty()).then_some(attempted),
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/download",
    tag = "download",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Resolution outcome; check `success`", body = DownloadResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DownloadRequest>,
) -> Result<Json<DownloadResponse>, HttpAppError> {
    let url = request.url.trim();
    tracing::debug!(url = %url, "Download requested");

    let response = match state.pipeline.run(url).await {
        Ok(outcome) => {
            tracing::info!(
                provider = %outcome.provider,
                platform = %outcome.platform,
                stored = outcome.stored.is_some(),
                "Download request succeeded"
            );
            DownloadResponse::from(outcome)
        }
        Err(err) => DownloadResponse::from(err),
    };

    Ok(Json(response))
}
