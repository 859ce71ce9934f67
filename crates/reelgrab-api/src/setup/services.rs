//! Service initialization

use crate::state::AppState;
use anyhow::{Context, Result};
use reelgrab_core::{Config, Platform};
use reelgrab_services::{
    ssrf, DownloadPipeline, MediaAcquirer, ProviderRegistry, ResolutionEngine, RetentionManager, Storage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Build the provider registry from the configured per-platform order.
pub fn build_registry(config: &Config) -> Result<ProviderRegistry> {
    let registry = ProviderRegistry::from_order(
        config.provider_order(Platform::TikTok),
        config.provider_order(Platform::Instagram),
    )
    .context("Invalid provider configuration")?;

    tracing::info!(
        tiktok = ?registry.names_for(Platform::TikTok),
        instagram = ?registry.names_for(Platform::Instagram),
        "Provider registry loaded"
    );
    Ok(registry)
}

/// Wire the resolver, acquirer, retention manager and pipeline into AppState.
pub fn initialize_services(
    config: &Config,
    registry: ProviderRegistry,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let client = reqwest::Client::builder()
        .redirect(ssrf::redirect_policy(config.allow_private_media_hosts()))
        .build()
        .context("Failed to build HTTP client")?;

    let engine = Arc::new(ResolutionEngine::new(
        client.clone(),
        Arc::new(registry),
        config.resolution_mode(),
    ));

    let acquirer = config.acquire_media().then(|| {
        Arc::new(MediaAcquirer::new(
            client,
            storage.clone(),
            config.transfer_timeout(),
            config.max_media_bytes(),
        )
        .allow_private_hosts(config.allow_private_media_hosts()))
    });

    let retention = Arc::new(RetentionManager::new(
        storage.base_path(),
        config.retention_ttl(),
    ));

    let pipeline = Arc::new(DownloadPipeline::new(
        engine,
        acquirer,
        retention.clone(),
        config.attempt_timeout(),
        config.request_timeout(),
    ));

    tracing::info!(
        resolution_mode = %config.resolution_mode(),
        acquire_media = config.acquire_media(),
        allow_private_media_hosts = config.allow_private_media_hosts(),
        retention_ttl_secs = config.retention_ttl().as_secs(),
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pipeline,
        storage,
        retention,
    }))
}

/// Start the periodic retention sweep unless it is disabled (interval 0).
pub fn start_retention_sweep(config: &Config, state: &AppState) -> Option<JoinHandle<()>> {
    let interval_secs = config.retention_sweep_interval_secs();
    if interval_secs == 0 {
        tracing::info!("Background retention sweep disabled");
        return None;
    }

    tracing::info!(interval_secs, "Background retention sweep enabled");
    Some(
        state
            .retention
            .clone()
            .start(Duration::from_secs(interval_secs)),
    )
}
