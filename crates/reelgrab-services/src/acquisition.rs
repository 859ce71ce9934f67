//! Media acquisition: stream a resolved media URL into storage.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use reelgrab_core::{AppError, HeaderError, HeaderSet, StoredMedia};
use reelgrab_storage::{MediaReader, Storage, StorageError};
use thiserror::Error;
use tokio_util::io::StreamReader;

use crate::ssrf::validate_url_for_ssrf;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),

    #[error("Media URL refused: {0}")]
    Blocked(String),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Origin returned status {0}")]
    Status(u16),

    #[error("Transfer timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid request headers: {0}")]
    Headers(#[from] HeaderError),
}

impl From<AcquisitionError> for AppError {
    fn from(err: AcquisitionError) -> Self {
        AppError::AcquisitionFailed(err.to_string())
    }
}

/// Streams remote media into a `Storage` backend.
///
/// Nothing is written before the origin answers with a 2xx status, and the
/// backend removes its partial file on any later failure, so a failed
/// acquisition never leaves a file behind.
pub struct MediaAcquirer {
    client: reqwest::Client,
    storage: Arc<dyn Storage>,
    transfer_timeout: Duration,
    max_bytes: u64,
    headers: HeaderSet,
    allow_private_hosts: bool,
}

impl MediaAcquirer {
    pub fn new(
        client: reqwest::Client,
        storage: Arc<dyn Storage>,
        transfer_timeout: Duration,
        max_bytes: u64,
    ) -> Self {
        Self {
            client,
            storage,
            transfer_timeout,
            max_bytes,
            headers: HeaderSet::browser().with("Accept", "*/*"),
            allow_private_hosts: false,
        }
    }

    /// Permit loopback and private-network origins (local development and tests).
    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    /// Layer extra headers (e.g. a Referer some CDNs insist on) over the browser set.
    pub fn with_headers(mut self, overrides: &HeaderSet) -> Self {
        self.headers = self.headers.merged(overrides);
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    #[tracing::instrument(skip(self), fields(max_bytes = self.max_bytes))]
    pub async fn acquire(&self, media_url: &str) -> Result<StoredMedia, AcquisitionError> {
        let parsed = reqwest::Url::parse(media_url)
            .map_err(|_| AcquisitionError::InvalidUrl(media_url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AcquisitionError::InvalidUrl(media_url.to_string()));
        }
        validate_url_for_ssrf(&parsed, self.allow_private_hosts)
            .await
            .map_err(|reason| {
                tracing::warn!(url = %media_url, error = %reason, "SSRF validation failed");
                AcquisitionError::Blocked(reason)
            })?;

        let start = std::time::Instant::now();
        let result = tokio::time::timeout(self.transfer_timeout, self.transfer(parsed))
            .await
            .map_err(|_| AcquisitionError::Timeout(self.transfer_timeout))?;

        match &result {
            Ok(media) => tracing::info!(
                filename = %media.filename,
                size_bytes = media.size_bytes,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Media acquired"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Media acquisition failed"
            ),
        }
        result
    }

    async fn transfer(&self, url: reqwest::Url) -> Result<StoredMedia, AcquisitionError> {
        let headers = self.headers.to_header_map()?;
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(AcquisitionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status(status.as_u16()));
        }

        let expected_length = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let reader: MediaReader = Box::pin(StreamReader::new(Box::pin(stream)));

        let media = self
            .storage
            .store_stream(expected_length, self.max_bytes, reader)
            .await?;
        Ok(media)
    }
}
