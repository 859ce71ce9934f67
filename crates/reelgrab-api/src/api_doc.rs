//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

/// Returns the OpenAPI document served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelgrab API",
        version = "0.1.0",
        description = "Resolve TikTok and Instagram post links to direct media URLs through an ordered set of third-party providers, optionally keeping a short-lived local copy."
    ),
    paths(
        handlers::download::download,
        handlers::media::get_media,
        handlers::media::delete_media,
        handlers::health::health_check,
        handlers::health::test_endpoint,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::download::DownloadRequest,
        handlers::download::DownloadResponse,
        handlers::download::DownloadSuccess,
        handlers::download::DownloadFailure,
        handlers::health::HealthResponse,
        handlers::health::StorageHealth,
        handlers::health::TestResponse,
    )),
    tags(
        (name = "download", description = "Link resolution and media acquisition"),
        (name = "media", description = "Locally stored media"),
        (name = "health", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;
