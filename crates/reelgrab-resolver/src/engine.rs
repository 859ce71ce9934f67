//! Resolution engine: walks the registry for a platform until one provider
//! yields a usable media URL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use reelgrab_core::{AppError, HeaderError, HeaderSet, Platform, ResolutionMode, ResolutionResult};
use thiserror::Error;

use crate::descriptor::ProviderDescriptor;
use crate::registry::ProviderRegistry;
use crate::transform::ExtractedMedia;

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub media_url: String,
    pub title: Option<String>,
    pub provider: String,
    /// Providers tried, in registry order.
    pub attempted: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("UnsupportedPlatform")]
    UnsupportedPlatform,

    #[error("no provider could resolve")]
    Exhausted { attempted: Vec<String> },
}

impl ResolutionError {
    pub fn attempted(&self) -> &[String] {
        match self {
            ResolutionError::Exhausted { attempted } => attempted,
            _ => &[],
        }
    }
}

impl From<ResolutionError> for AppError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::InvalidInput(msg) => AppError::InvalidInput(msg),
            ResolutionError::UnsupportedPlatform => {
                AppError::UnsupportedPlatform("URL matches no supported platform".to_string())
            }
            ResolutionError::Exhausted { attempted } => {
                AppError::ResolutionExhausted { attempted }
            }
        }
    }
}

impl From<ResolvedMedia> for ResolutionResult {
    fn from(media: ResolvedMedia) -> Self {
        ResolutionResult::resolved(media.media_url, media.title, media.provider, media.attempted)
    }
}

impl From<ResolutionError> for ResolutionResult {
    fn from(err: ResolutionError) -> Self {
        let attempted = err.attempted().to_vec();
        ResolutionResult::failed(err.to_string(), attempted)
    }
}

/// Collapse an engine outcome into the serializable result shape.
pub fn summarize(result: Result<ResolvedMedia, ResolutionError>) -> ResolutionResult {
    match result {
        Ok(media) => media.into(),
        Err(err) => err.into(),
    }
}

/// Why a single provider attempt produced nothing. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("source URL not accepted by this provider")]
    SourceNotAccepted,

    #[error("response did not contain a usable media URL")]
    NoMatch,

    #[error("invalid request headers: {0}")]
    Headers(#[from] HeaderError),
}

pub struct ResolutionEngine {
    client: reqwest::Client,
    registry: Arc<ProviderRegistry>,
    mode: ResolutionMode,
    base_headers: HeaderSet,
}

impl ResolutionEngine {
    pub fn new(client: reqwest::Client, registry: Arc<ProviderRegistry>, mode: ResolutionMode) -> Self {
        Self {
            client,
            registry,
            mode,
            base_headers: HeaderSet::browser(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Resolve `source_url` against the providers registered for `platform`.
    ///
    /// Each attempt gets its own `attempt_timeout`. Provider failures are
    /// absorbed; only exhaustion of the whole list is reported.
    #[tracing::instrument(skip(self), fields(mode = %self.mode))]
    pub async fn resolve(
        &self,
        platform: Platform,
        source_url: &str,
        attempt_timeout: Duration,
    ) -> Result<ResolvedMedia, ResolutionError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(ResolutionError::InvalidInput("URL is required".to_string()));
        }
        if !platform.is_supported() {
            return Err(ResolutionError::UnsupportedPlatform);
        }

        let providers = self.registry.providers_for(platform);
        let result = match self.mode {
            ResolutionMode::Sequential => {
                self.resolve_sequential(&providers, source_url, attempt_timeout)
                    .await
            }
            ResolutionMode::Race => {
                self.resolve_race(&providers, source_url, attempt_timeout)
                    .await
            }
        };

        match &result {
            Ok(media) => tracing::info!(
                provider = %media.provider,
                attempts = media.attempted.len(),
                "Resolved media URL"
            ),
            Err(err) => tracing::warn!(
                attempted = ?err.attempted(),
                "All providers failed"
            ),
        }
        result
    }

    async fn resolve_sequential(
        &self,
        providers: &[&ProviderDescriptor],
        source_url: &str,
        attempt_timeout: Duration,
    ) -> Result<ResolvedMedia, ResolutionError> {
        let mut attempted = Vec::with_capacity(providers.len());

        for descriptor in providers {
            attempted.push(descriptor.name.clone());
            if let Ok(extracted) = self.attempt(descriptor, source_url, attempt_timeout).await {
                return Ok(ResolvedMedia {
                    media_url: extracted.media_url,
                    title: extracted.title,
                    provider: descriptor.name.clone(),
                    attempted,
                });
            }
        }

        Err(ResolutionError::Exhausted { attempted })
    }

    /// Every provider is issued a request up front; the first success wins
    /// and dropping the remaining futures cancels them.
    async fn resolve_race(
        &self,
        providers: &[&ProviderDescriptor],
        source_url: &str,
        attempt_timeout: Duration,
    ) -> Result<ResolvedMedia, ResolutionError> {
        let attempted: Vec<String> = providers.iter().map(|d| d.name.clone()).collect();

        let mut in_flight: FuturesUnordered<_> = providers
            .iter()
            .map(|descriptor| async move {
                let outcome = self.attempt(descriptor, source_url, attempt_timeout).await;
                (*descriptor, outcome)
            })
            .collect();

        while let Some((descriptor, outcome)) = in_flight.next().await {
            if let Ok(extracted) = outcome {
                return Ok(ResolvedMedia {
                    media_url: extracted.media_url,
                    title: extracted.title,
                    provider: descriptor.name.clone(),
                    attempted,
                });
            }
        }

        Err(ResolutionError::Exhausted { attempted })
    }

    async fn attempt(
        &self,
        descriptor: &ProviderDescriptor,
        source_url: &str,
        attempt_timeout: Duration,
    ) -> Result<ExtractedMedia, AttemptError> {
        let started = Instant::now();
        let outcome = self
            .attempt_inner(descriptor, source_url, attempt_timeout)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(extracted) => tracing::debug!(
                provider = %descriptor.name,
                platform = %descriptor.platform,
                elapsed_ms = elapsed_ms,
                media_url = %extracted.media_url,
                "Provider attempt succeeded"
            ),
            Err(AttemptError::NoMatch) => tracing::debug!(
                provider = %descriptor.name,
                platform = %descriptor.platform,
                elapsed_ms = elapsed_ms,
                "Provider response had no usable media URL"
            ),
            Err(e) => tracing::warn!(
                provider = %descriptor.name,
                platform = %descriptor.platform,
                elapsed_ms = elapsed_ms,
                error = %e,
                "Provider attempt failed"
            ),
        }
        outcome
    }

    async fn attempt_inner(
        &self,
        descriptor: &ProviderDescriptor,
        source_url: &str,
        attempt_timeout: Duration,
    ) -> Result<ExtractedMedia, AttemptError> {
        if !descriptor.accepts_source(source_url) {
            return Err(AttemptError::SourceNotAccepted);
        }
        let request = descriptor.build_request(&self.client, &self.base_headers, source_url)?;

        let body = tokio::time::timeout(attempt_timeout, async {
            let response = request.send().await.map_err(AttemptError::Transport)?;
            let status = response.status();
            if !status.is_success() {
                return Err(AttemptError::Status(status.as_u16()));
            }
            response.text().await.map_err(AttemptError::Body)
        })
        .await
        .map_err(|_| AttemptError::Timeout(attempt_timeout))??;

        descriptor.normalize(&body).ok_or(AttemptError::NoMatch)
    }
}
