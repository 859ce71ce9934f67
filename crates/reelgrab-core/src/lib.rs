//! Reelgrab Core Library
//!
//! This crate provides the domain models, error taxonomy, header configuration
//! and application configuration shared by every Reelgrab component.

pub mod config;
pub mod constants;
pub mod error;
pub mod headers;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, DownloaderConfig, ResolutionMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use headers::{HeaderError, HeaderSet};
pub use models::{Platform, ResolutionResult, StoredMedia};
