//! Storage abstraction trait
//!
//! This module defines the Storage trait that media backends implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reelgrab_core::StoredMedia;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store failed: {0}")]
    StoreFailed(String),

    #[error("Media exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Transfer ended after {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid filename: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Source of bytes for `store_stream`.
pub type MediaReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage abstraction trait
///
/// Stored files are addressed only by the filename the backend generated for
/// them. A failed or cancelled `store_stream` leaves nothing behind.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` into a newly named file and return its descriptor.
    ///
    /// Fails with `TooLarge` once more than `max_length` bytes arrive and with
    /// `Truncated` when fewer than `expected_length` bytes arrive. In every
    /// failure case (including the future being dropped) the partial file is
    /// removed.
    async fn store_stream(
        &self,
        expected_length: Option<u64>,
        max_length: u64,
        reader: MediaReader,
    ) -> StorageResult<StoredMedia>;

    /// Open a stored file as a stream of chunks.
    async fn download_stream(&self, filename: &str) -> StorageResult<ByteStream>;

    /// Delete a stored file. Returns false if it was already gone.
    async fn delete(&self, filename: &str) -> StorageResult<bool>;

    /// Check if a file exists
    async fn exists(&self, filename: &str) -> StorageResult<bool>;

    /// Descriptor of a stored file, with `created_at` taken from its mtime.
    async fn metadata(&self, filename: &str) -> StorageResult<StoredMedia>;

    /// Every complete file in the storage directory.
    async fn list(&self) -> StorageResult<Vec<StoredMedia>>;

    /// Directory backing this storage.
    fn base_path(&self) -> &Path;

    /// Public URL a stored file is served under.
    fn public_url(&self, filename: &str) -> String;
}
