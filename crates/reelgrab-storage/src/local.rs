use crate::traits::{ByteStream, MediaReader, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reelgrab_core::constants::{MEDIA_EXTENSION, PARTIAL_SUFFIX};
use reelgrab_core::StoredMedia;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// Attempts at finding an unused name before giving up.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

/// Reject anything that is not a plain generated media filename.
pub fn validate_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.starts_with('.')
    {
        return Err(StorageError::InvalidKey(
            "Filename contains invalid characters".to_string(),
        ));
    }
    if filename.ends_with(PARTIAL_SUFFIX) {
        return Err(StorageError::InvalidKey(
            "Filename refers to an incomplete file".to_string(),
        ));
    }
    if !filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidKey(
            "Filename contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn is_partial(name: &str) -> bool {
    name.ends_with(PARTIAL_SUFFIX)
}

/// Removes the partial file unless disarmed. Covers both error returns and
/// the enclosing future being dropped mid-transfer.
struct PartialFileGuard {
    path: Option<PathBuf>,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed partial file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove partial file"
                ),
            }
        }
    }
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Directory media files are written to (created if missing)
    /// * `base_url` - Public prefix files are served under (e.g. "/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn filename_to_path(&self, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.base_path.join(filename))
    }

    /// `{unix_millis}-{8 hex}.mp4`
    fn generate_filename() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            &suffix[..8],
            MEDIA_EXTENSION
        )
    }

    /// Claim a fresh name by exclusively creating its partial file.
    async fn create_partial(&self) -> StorageResult<(String, PathBuf, fs::File)> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = Self::generate_filename();
            if fs::try_exists(self.base_path.join(&filename))
                .await
                .unwrap_or(false)
            {
                continue;
            }

            let part_path = self
                .base_path
                .join(format!("{}{}", filename, PARTIAL_SUFFIX));
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&part_path)
                .await
            {
                Ok(file) => return Ok((filename, part_path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::StoreFailed(format!(
                        "Failed to create file {}: {}",
                        part_path.display(),
                        e
                    )))
                }
            }
        }

        Err(StorageError::StoreFailed(
            "Could not allocate a unique filename".to_string(),
        ))
    }

    fn media_from_metadata(&self, filename: &str, meta: &std::fs::Metadata) -> StoredMedia {
        let created_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        StoredMedia {
            filename: filename.to_string(),
            path: self.base_path.join(filename),
            created_at,
            size_bytes: meta.len(),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store_stream(
        &self,
        expected_length: Option<u64>,
        max_length: u64,
        mut reader: MediaReader,
    ) -> StorageResult<StoredMedia> {
        if let Some(expected) = expected_length {
            if expected > max_length {
                return Err(StorageError::TooLarge { limit: max_length });
            }
        }

        let start = std::time::Instant::now();
        let (filename, part_path, mut file) = self.create_partial().await?;
        let guard = PartialFileGuard::new(part_path.clone());

        let mut limited = (&mut reader).take(max_length.saturating_add(1));
        let bytes_copied = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(|e| {
                StorageError::StoreFailed(format!(
                    "Failed to write stream to file {}: {}",
                    part_path.display(),
                    e
                ))
            })?;

        if bytes_copied > max_length {
            return Err(StorageError::TooLarge { limit: max_length });
        }
        if let Some(expected) = expected_length {
            if bytes_copied < expected {
                return Err(StorageError::Truncated {
                    expected,
                    received: bytes_copied,
                });
            }
        }

        file.sync_all().await.map_err(|e| {
            StorageError::StoreFailed(format!(
                "Failed to sync file {}: {}",
                part_path.display(),
                e
            ))
        })?;
        drop(file);

        let path = self.base_path.join(&filename);
        fs::rename(&part_path, &path).await.map_err(|e| {
            StorageError::StoreFailed(format!(
                "Failed to finalize file {}: {}",
                path.display(),
                e
            ))
        })?;
        guard.disarm();

        tracing::info!(
            path = %path.display(),
            filename = %filename,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream store successful"
        );

        Ok(StoredMedia {
            filename,
            path,
            created_at: Utc::now(),
            size_bytes: bytes_copied,
        })
    }

    async fn download_stream(&self, filename: &str) -> StorageResult<ByteStream> {
        let path = self.filename_to_path(filename)?;

        // Opened directly: a purge may remove the file at any point before this.
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(filename.to_string())
            } else {
                StorageError::DownloadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let name = filename.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(filename = %name, error = %e, "Local storage stream read error");
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, filename: &str) -> StorageResult<bool> {
        let path = self.filename_to_path(filename)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    filename = %filename,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage delete successful"
                );
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, filename: &str) -> StorageResult<bool> {
        let path = self.filename_to_path(filename)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn metadata(&self, filename: &str) -> StorageResult<StoredMedia> {
        let path = self.filename_to_path(filename)?;
        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(filename.to_string())
            } else {
                StorageError::IoError(e)
            }
        })?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(filename.to_string()));
        }
        Ok(self.media_from_metadata(filename, &meta))
    }

    async fn list(&self) -> StorageResult<Vec<StoredMedia>> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut media = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_partial(&name) || validate_filename(&name).is_err() {
                continue;
            }
            // Entries can vanish between listing and stat.
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            media.push(self.media_from_metadata(&name, &meta));
        }

        media.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(media)
    }

    fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio_util::io::StreamReader;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "/media".to_string()).await.unwrap()
    }

    fn reader(data: &[u8]) -> MediaReader {
        Box::pin(std::io::Cursor::new(data.to_vec()))
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_store_and_stream_back() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let data = b"fake mp4 payload";

        let media = storage
            .store_stream(Some(data.len() as u64), 1024, reader(data))
            .await
            .unwrap();

        assert!(media.filename.ends_with(".mp4"));
        assert_eq!(media.size_bytes, data.len() as u64);
        assert_eq!(dir_entries(dir.path()), vec![media.filename.clone()]);
        assert_eq!(storage.public_url(&media.filename), format!("/media/{}", media.filename));

        let mut stream = storage.download_stream(&media.filename).await.unwrap();
        let mut downloaded = Vec::new();
        while let Some(chunk) = stream.next().await {
            downloaded.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(downloaded, data);
    }

    #[tokio::test]
    async fn test_generated_names_are_unique() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let mut names = Vec::new();
        for _ in 0..20 {
            let media = storage.store_stream(None, 1024, reader(b"x")).await.unwrap();
            names.push(media.filename);
        }
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }

    #[tokio::test]
    async fn test_mid_stream_error_leaves_no_file() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"first chunk")),
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "reset by peer")),
        ]);
        let reader: MediaReader = Box::pin(StreamReader::new(chunks));

        let result = storage.store_stream(Some(4096), 8192, reader).await;
        assert!(matches!(result, Err(StorageError::StoreFailed(_))));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_short_transfer_is_truncated() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.store_stream(Some(100), 1024, reader(b"only ten b")).await;
        assert!(matches!(
            result,
            Err(StorageError::Truncated {
                expected: 100,
                received: 10
            })
        ));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_oversized_transfer_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.store_stream(None, 4, reader(b"too many bytes")).await;
        assert!(matches!(result, Err(StorageError::TooLarge { limit: 4 })));
        assert!(dir_entries(dir.path()).is_empty());

        let result = storage.store_stream(Some(10), 4, reader(b"0123456789")).await;
        assert!(matches!(result, Err(StorageError::TooLarge { .. })));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_store_removes_partial_file() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let chunks = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(b"start"))])
            .chain(stream::pending());
        let reader: MediaReader = Box::pin(StreamReader::new(chunks));

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            storage.store_stream(None, 1024, reader),
        )
        .await;
        assert!(result.is_err());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download_stream("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.metadata(".hidden").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.download_stream("123-abc.mp4.part").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_and_missing_files() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let media = storage.store_stream(None, 1024, reader(b"data")).await.unwrap();

        assert!(storage.exists(&media.filename).await.unwrap());
        assert!(storage.delete(&media.filename).await.unwrap());
        assert!(!storage.delete(&media.filename).await.unwrap());
        assert!(!storage.exists(&media.filename).await.unwrap());
        assert!(matches!(
            storage.download_stream(&media.filename).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.metadata(&media.filename).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_partial_files() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let media = storage.store_stream(None, 1024, reader(b"data")).await.unwrap();
        std::fs::write(dir.path().join("1-deadbeef.mp4.part"), b"half").unwrap();

        let listed = storage.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, media.filename);
        assert_eq!(listed[0].size_bytes, 4);
    }
}
