//! Test helpers: build AppState and router for integration tests.
//!
//! Providers are pointed at a mockito server, so no test reaches the network.
//! Run with `cargo test -p reelgrab-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use mockito::{Matcher, Mock, ServerGuard};
use reelgrab_api::setup::{routes, services, storage};
use reelgrab_api::state::AppState;
use reelgrab_core::{Config, DownloaderConfig, Platform};
use reelgrab_resolver::{ProviderDescriptor, ProviderRegistry, ResponseTransform};
use std::sync::Arc;
use tempfile::TempDir;

pub const TIKTOK_URL: &str = "https://www.tiktok.com/@someone/video/7234567890123456789";
pub const INSTAGRAM_URL: &str = "https://www.instagram.com/reel/Cabc123/";

/// Test application: server, provider mock, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub mock: ServerGuard,
    pub state: Arc<AppState>,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Absolute URL of a path on the provider mock.
    pub fn mock_url(&self, path: &str) -> String {
        format!("{}{}", self.mock.url(), path)
    }

    /// Names of every entry in the storage directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.temp_dir.path())
            .expect("read storage dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// A provider endpoint answering with `status` and a JSON `body`.
    pub async fn provider(&mut self, path: &str, status: usize, body: &str) -> Mock {
        self.mock
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// A CDN endpoint serving `body` as video.
    pub async fn media(&mut self, path: &str, status: usize, body: &[u8]) -> Mock {
        self.mock
            .mock("GET", path)
            .with_status(status)
            .with_header("content-type", "video/mp4")
            .with_body(body)
            .create_async()
            .await
    }
}

/// Two TikTok providers (`primary`, then `fallback`) and one Instagram provider.
fn mock_registry(base: &str) -> ProviderRegistry {
    ProviderRegistry::new(vec![
        ProviderDescriptor::get(
            "primary",
            Platform::TikTok,
            format!("{}/primary?url={{url}}", base),
            ResponseTransform::json_pointer("/data/play", Some("/data/title")),
        ),
        ProviderDescriptor::get(
            "fallback",
            Platform::TikTok,
            format!("{}/fallback?url={{url}}", base),
            ResponseTransform::json_pointer("/url", None),
        ),
        ProviderDescriptor::get(
            "insta",
            Platform::Instagram,
            format!("{}/insta?url={{url}}", base),
            ResponseTransform::json_pointer("/video", None),
        ),
    ])
}

/// Setup test app with local storage in a temp dir and media acquisition enabled.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(true).await
}

pub async fn setup_test_app_with(acquire_media: bool) -> TestApp {
    let mock = mockito::Server::new_async().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let config = Config::new(DownloaderConfig {
        storage_dir: temp_dir.path().to_path_buf(),
        attempt_timeout_ms: 2_000,
        transfer_timeout_ms: 5_000,
        request_timeout_secs: 10,
        retention_sweep_interval_secs: 0,
        acquire_media,
        // Mock origins listen on loopback.
        allow_private_media_hosts: true,
        max_media_bytes: 1024 * 1024,
        ..DownloaderConfig::default()
    });
    config.validate().expect("Test config should be valid");

    let storage = storage::setup_storage(&config)
        .await
        .expect("Failed to set up storage");
    let state = services::initialize_services(&config, mock_registry(&mock.url()), storage)
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to set up routes");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        mock,
        state,
        temp_dir,
    }
}
