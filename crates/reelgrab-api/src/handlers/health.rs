//! Operational endpoints.

use crate::constants::SERVICE_VERSION;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use reelgrab_core::constants::SERVICE_NAME;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub storage: StorageHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StorageHealth {
    pub status: String,
    /// Complete media files currently held
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage directory is unusable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, storage) = match state.storage.list().await {
        Ok(files) => (
            StatusCode::OK,
            StorageHealth {
                status: "healthy".to_string(),
                files: Some(files.len()),
                error: None,
            },
        ),
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                StorageHealth {
                    status: "unhealthy".to_string(),
                    files: None,
                    error: Some(e.to_string()),
                },
            )
        }
    };

    let overall = if status.is_success() { "healthy" } else { "unhealthy" };
    (
        status,
        Json(HealthResponse {
            status: overall.to_string(),
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
            storage,
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/test",
    tag = "health",
    responses(
        (status = 200, description = "Service is reachable", body = TestResponse)
    )
)]
pub async fn test_endpoint() -> Json<TestResponse> {
    Json(TestResponse {
        status: "ok".to_string(),
        message: format!("{} is running", SERVICE_NAME),
        timestamp: Utc::now(),
        version: SERVICE_VERSION.to_string(),
    })
}
