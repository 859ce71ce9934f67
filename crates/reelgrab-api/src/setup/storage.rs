//! Storage initialization

use anyhow::{Context, Result};
use reelgrab_core::Config;
use reelgrab_services::{LocalStorage, Storage};
use std::sync::Arc;

/// Create the media directory if needed and open local storage on it.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(
        config.storage_dir().clone(),
        config.public_media_base_url().to_string(),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to initialize storage at {}",
            config.storage_dir().display()
        )
    })?;

    tracing::info!(
        storage_dir = %config.storage_dir().display(),
        public_base_url = %config.public_media_base_url(),
        "Local storage initialized"
    );

    Ok(Arc::new(storage))
}
