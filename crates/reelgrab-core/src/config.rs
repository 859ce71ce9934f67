//! Configuration module
//!
//! Settings for the download service: listen/CORS basics, the storage
//! directory and retention policy, resolution and transfer timeouts, and the
//! per-platform provider order.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::Platform;

const SERVER_PORT: u16 = 3000;
const RETENTION_TTL_SECONDS: u64 = 3600;
const ATTEMPT_TIMEOUT_MS: u64 = 15_000;
const TRANSFER_TIMEOUT_MS: u64 = 120_000;
const REQUEST_TIMEOUT_SECS: u64 = 180;
const RETENTION_SWEEP_INTERVAL_SECS: u64 = 600;
const MAX_MEDIA_BYTES: u64 = 500 * 1024 * 1024;

/// How providers for one platform are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// One provider at a time, in registry order, stopping at the first success.
    #[default]
    Sequential,
    /// All providers at once; the first success wins and the rest are dropped.
    Race,
}

impl FromStr for ResolutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(ResolutionMode::Sequential),
            "race" => Ok(ResolutionMode::Race),
            _ => Err(anyhow::anyhow!(
                "Invalid resolution mode: {} (expected 'sequential' or 'race')",
                s
            )),
        }
    }
}

impl Display for ResolutionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResolutionMode::Sequential => write!(f, "sequential"),
            ResolutionMode::Race => write!(f, "race"),
        }
    }
}

/// Base configuration for the HTTP listener
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `compact` or `json`
    pub log_format: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            log_format: "compact".to_string(),
        }
    }
}

/// Download service configuration
#[derive(Clone, Debug)]
pub struct DownloaderConfig {
    pub base: BaseConfig,
    pub storage_dir: PathBuf,
    /// Prefix joined with a stored filename to form `downloadUrl`
    pub public_media_base_url: String,
    pub retention_ttl_seconds: u64,
    pub attempt_timeout_ms: u64,
    pub transfer_timeout_ms: u64,
    pub request_timeout_secs: u64,
    /// 0 = background sweep disabled; purge still runs before each acquisition.
    pub retention_sweep_interval_secs: u64,
    pub acquire_media: bool,
    pub max_media_bytes: u64,
    /// Let acquisition reach loopback and private-network hosts.
    pub allow_private_media_hosts: bool,
    pub resolution_mode: ResolutionMode,
    /// Provider names for TikTok; None keeps the built-in order.
    pub tiktok_providers: Option<Vec<String>>,
    /// Provider names for Instagram; None keeps the built-in order.
    pub instagram_providers: Option<Vec<String>>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            storage_dir: PathBuf::from("./downloads"),
            public_media_base_url: "/media".to_string(),
            retention_ttl_seconds: RETENTION_TTL_SECONDS,
            attempt_timeout_ms: ATTEMPT_TIMEOUT_MS,
            transfer_timeout_ms: TRANSFER_TIMEOUT_MS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            retention_sweep_interval_secs: RETENTION_SWEEP_INTERVAL_SECS,
            acquire_media: true,
            max_media_bytes: MAX_MEDIA_BYTES,
            allow_private_media_hosts: false,
            resolution_mode: ResolutionMode::Sequential,
            tiktok_providers: None,
            instagram_providers: None,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<DownloaderConfig>);

impl Config {
    pub fn new(config: DownloaderConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &DownloaderConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = DownloaderConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config::new(config))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn storage_dir(&self) -> &PathBuf {
        &self.inner().storage_dir
    }

    pub fn public_media_base_url(&self) -> &str {
        &self.inner().public_media_base_url
    }

    pub fn retention_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().retention_ttl_seconds)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.inner().attempt_timeout_ms)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.inner().transfer_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().request_timeout_secs)
    }

    pub fn retention_sweep_interval_secs(&self) -> u64 {
        self.inner().retention_sweep_interval_secs
    }

    pub fn acquire_media(&self) -> bool {
        self.inner().acquire_media
    }

    pub fn max_media_bytes(&self) -> u64 {
        self.inner().max_media_bytes
    }

    pub fn allow_private_media_hosts(&self) -> bool {
        self.inner().allow_private_media_hosts
    }

    pub fn resolution_mode(&self) -> ResolutionMode {
        self.inner().resolution_mode
    }

    /// Configured provider order for a platform, if overridden.
    pub fn provider_order(&self, platform: Platform) -> Option<&[String]> {
        match platform {
            Platform::TikTok => self.inner().tiktok_providers.as_deref(),
            Platform::Instagram => self.inner().instagram_providers.as_deref(),
            Platform::Unsupported => None,
        }
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl DownloaderConfig {
    /// Build from a key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format: lookup("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .to_lowercase(),
        };

        let resolution_mode = match lookup("RESOLUTION_MODE") {
            Some(mode) => mode.parse()?,
            None => ResolutionMode::Sequential,
        };

        let config = DownloaderConfig {
            base,
            storage_dir: PathBuf::from(
                lookup("STORAGE_DIR").unwrap_or_else(|| "./downloads".to_string()),
            ),
            public_media_base_url: lookup("PUBLIC_MEDIA_BASE_URL")
                .unwrap_or_else(|| "/media".to_string())
                .trim_end_matches('/')
                .to_string(),
            retention_ttl_seconds: lookup("RETENTION_TTL_SECONDS")
                .unwrap_or_else(|| RETENTION_TTL_SECONDS.to_string())
                .parse()
                .unwrap_or(RETENTION_TTL_SECONDS),
            attempt_timeout_ms: lookup("ATTEMPT_TIMEOUT_MS")
                .unwrap_or_else(|| ATTEMPT_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(ATTEMPT_TIMEOUT_MS),
            transfer_timeout_ms: lookup("TRANSFER_TIMEOUT_MS")
                .unwrap_or_else(|| TRANSFER_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(TRANSFER_TIMEOUT_MS),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            retention_sweep_interval_secs: lookup("RETENTION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|| RETENTION_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(RETENTION_SWEEP_INTERVAL_SECS),
            acquire_media: lookup("ACQUIRE_MEDIA")
                .unwrap_or_else(|| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            max_media_bytes: lookup("MAX_MEDIA_BYTES")
                .unwrap_or_else(|| MAX_MEDIA_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_MEDIA_BYTES),
            allow_private_media_hosts: lookup("ALLOW_PRIVATE_MEDIA_HOSTS")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            resolution_mode,
            tiktok_providers: lookup("TIKTOK_PROVIDERS").map(|s| parse_list(&s)),
            instagram_providers: lookup("INSTAGRAM_PROVIDERS").map(|s| parse_list(&s)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Provider names are checked against the catalogue when the registry is built.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if is_production_env(&self.base.environment)
            && self.base.cors_origins.iter().any(|o| o == "*")
        {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.retention_ttl_seconds == 0 {
            return Err(anyhow::anyhow!(
                "RETENTION_TTL_SECONDS must be greater than 0"
            ));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(anyhow::anyhow!("ATTEMPT_TIMEOUT_MS must be greater than 0"));
        }
        if self.transfer_timeout_ms == 0 {
            return Err(anyhow::anyhow!(
                "TRANSFER_TIMEOUT_MS must be greater than 0"
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "REQUEST_TIMEOUT_SECS must be greater than 0"
            ));
        }
        if self.max_media_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_MEDIA_BYTES must be greater than 0"));
        }

        if matches!(&self.tiktok_providers, Some(list) if list.is_empty()) {
            return Err(anyhow::anyhow!(
                "TIKTOK_PROVIDERS must name at least one provider"
            ));
        }
        if matches!(&self.instagram_providers, Some(list) if list.is_empty()) {
            return Err(anyhow::anyhow!(
                "INSTAGRAM_PROVIDERS must name at least one provider"
            ));
        }

        if self.storage_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_DIR must not be empty"));
        }

        if !matches!(self.base.log_format.as_str(), "compact" | "json") {
            return Err(anyhow::anyhow!(
                "LOG_FORMAT must be 'compact' or 'json', got '{}'",
                self.base.log_format
            ));
        }

        Ok(())
    }
}
