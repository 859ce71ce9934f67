//! Request pipeline: classify, resolve, purge, acquire.

use std::sync::Arc;
use std::time::Duration;

use reelgrab_core::{AppError, Platform, StoredMedia};
use reelgrab_resolver::{ResolutionEngine, ResolutionError, ResolvedMedia};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};

use crate::acquisition::{AcquisitionError, MediaAcquirer};
use crate::retention::RetentionManager;

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub platform: Platform,
    pub media_url: String,
    /// Provider title, or the platform placeholder when none was returned.
    pub title: String,
    pub provider: String,
    pub attempted: Vec<String>,
    /// Present when acquisition is enabled.
    pub stored: Option<StoredMedia>,
    pub download_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Resolution succeeded but the media could not be stored.
    #[error("Acquisition failed: {source}")]
    Acquisition {
        resolved: ResolvedMedia,
        #[source]
        source: AcquisitionError,
    },

    #[error("Deadline of {0:?} reached before resolution finished")]
    DeadlineExceeded(Duration),
}

impl PipelineError {
    /// Direct media URL to offer instead, when one was resolved.
    pub fn alternative(&self) -> Option<&str> {
        match self {
            PipelineError::Acquisition { resolved, .. } => Some(&resolved.media_url),
            _ => None,
        }
    }

    pub fn attempted(&self) -> &[String] {
        match self {
            PipelineError::Resolution(err) => err.attempted(),
            PipelineError::Acquisition { resolved, .. } => &resolved.attempted,
            PipelineError::DeadlineExceeded(_) => &[],
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Resolution(err) => err.into(),
            PipelineError::Acquisition { source, .. } => source.into(),
            // In-flight attempts are cancelled, so none completed.
            PipelineError::DeadlineExceeded(_) => AppError::ResolutionExhausted {
                attempted: Vec::new(),
            },
        }
    }
}

pub struct DownloadPipeline {
    engine: Arc<ResolutionEngine>,
    /// None when acquisition is disabled; the pipeline then only resolves.
    acquirer: Option<Arc<MediaAcquirer>>,
    retention: Arc<RetentionManager>,
    attempt_timeout: Duration,
    request_timeout: Duration,
}

impl DownloadPipeline {
    pub fn new(
        engine: Arc<ResolutionEngine>,
        acquirer: Option<Arc<MediaAcquirer>>,
        retention: Arc<RetentionManager>,
        attempt_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            acquirer,
            retention,
            attempt_timeout,
            request_timeout,
        }
    }

    pub fn engine(&self) -> &ResolutionEngine {
        &self.engine
    }

    pub fn acquires_media(&self) -> bool {
        self.acquirer.is_some()
    }

    /// Run the whole pipeline for one source URL under the request deadline.
    /// Dropping the returned future aborts whatever step is in flight.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, source_url: &str) -> Result<DownloadOutcome, PipelineError> {
        let deadline = Instant::now() + self.request_timeout;
        let platform = Platform::classify(source_url);

        let resolved = timeout_at(
            deadline,
            self.engine
                .resolve(platform, source_url, self.attempt_timeout),
        )
        .await
        .map_err(|_| PipelineError::DeadlineExceeded(self.request_timeout))??;

        let title = resolved
            .title
            .clone()
            .unwrap_or_else(|| platform.placeholder_title());

        let Some(acquirer) = &self.acquirer else {
            return Ok(DownloadOutcome {
                platform,
                media_url: resolved.media_url,
                title,
                provider: resolved.provider,
                attempted: resolved.attempted,
                stored: None,
                download_url: None,
            });
        };

        if let Err(e) = self.retention.purge().await {
            tracing::warn!(error = %e, "Pre-acquisition purge failed, continuing");
        }

        let acquired = match timeout_at(deadline, acquirer.acquire(&resolved.media_url)).await {
            Ok(result) => result,
            Err(_) => Err(AcquisitionError::Timeout(self.request_timeout)),
        };

        match acquired {
            Ok(stored) => {
                let download_url = acquirer.storage().public_url(&stored.filename);
                Ok(DownloadOutcome {
                    platform,
                    media_url: resolved.media_url,
                    title,
                    provider: resolved.provider,
                    attempted: resolved.attempted,
                    stored: Some(stored),
                    download_url: Some(download_url),
                })
            }
            Err(source) => Err(PipelineError::Acquisition { resolved, source }),
        }
    }
}
