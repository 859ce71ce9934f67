//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use reelgrab_core::Config;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A fully wired application, ready to serve.
pub struct App {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    /// Background retention sweep, when enabled
    pub sweep: Option<JoinHandle<()>>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let registry = services::build_registry(&config)?;
    let storage = storage::setup_storage(&config).await?;
    let state = services::initialize_services(&config, registry, storage)?;
    let sweep = services::start_retention_sweep(&config, &state);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok(App {
        state,
        router,
        sweep,
    })
}
