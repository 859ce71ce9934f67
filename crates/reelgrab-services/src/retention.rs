//! Retention: keep the storage directory bounded by file age.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::time::interval;

/// Counts from one purge pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub scanned: usize,
    pub removed: usize,
    /// Entries that could not be inspected or deleted, or vanished first.
    pub skipped: usize,
}

/// Delete every regular file in `dir` whose mtime is more than `max_age` ago.
///
/// Per-entry failures are counted and skipped; only failing to open the
/// directory at all is an error. A missing directory is an empty one.
pub async fn purge_expired(dir: &Path, max_age: Duration) -> io::Result<PurgeReport> {
    let mut report = PurgeReport::default();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, dir = %dir.display(), "Failed to read directory entry");
                report.skipped += 1;
                continue;
            }
        };
        report.scanned += 1;

        let path = entry.path();
        let modified = match entry.metadata().await {
            Ok(meta) if meta.is_file() => match meta.modified() {
                Ok(modified) => modified,
                Err(_) => {
                    report.skipped += 1;
                    continue;
                }
            },
            Ok(_) => {
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping entry that cannot be inspected");
                report.skipped += 1;
                continue;
            }
        };

        // A clock step can put mtime in the future; that counts as fresh.
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Deleted expired file");
                report.removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete expired file");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Owns the retention policy for one storage directory.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    dir: PathBuf,
    max_age: Duration,
}

impl RetentionManager {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    #[tracing::instrument(skip(self), fields(dir = %self.dir.display(), max_age_secs = self.max_age.as_secs()))]
    pub async fn purge(&self) -> io::Result<PurgeReport> {
        let report = purge_expired(&self.dir, self.max_age).await?;
        tracing::debug!(
            scanned = report.scanned,
            removed = report.removed,
            skipped = report.skipped,
            "Retention purge completed"
        );
        Ok(report)
    }

    /// Start the background sweep. The first pass runs immediately.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(period);

            loop {
                sweep_interval.tick().await;

                match self.purge().await {
                    Ok(report) => tracing::info!(
                        scanned = report.scanned,
                        removed = report.removed,
                        skipped = report.skipped,
                        "Scheduled retention sweep completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled retention sweep failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_aged(dir: &Path, name: &str, age: Duration) {
        let path = dir.join(name);
        std::fs::write(&path, b"media").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let dir = tempdir().unwrap();
        let hour = Duration::from_secs(3600);
        write_aged(dir.path(), "old-1.mp4", hour * 2);
        write_aged(dir.path(), "old-2.mp4", hour * 5);
        write_aged(dir.path(), "fresh-1.mp4", Duration::from_secs(10));
        write_aged(dir.path(), "fresh-2.mp4", hour / 2);

        let report = purge_expired(dir.path(), hour).await.unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.removed, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(names(dir.path()), vec!["fresh-1.mp4", "fresh-2.mp4"]);
    }

    #[tokio::test]
    async fn test_purge_skips_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_aged(dir.path(), "old.mp4", Duration::from_secs(7200));

        let report = purge_expired(dir.path(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(names(dir.path()), vec!["nested"]);
    }

    #[tokio::test]
    async fn test_purge_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let report = purge_expired(&dir.path().join("absent"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(report, PurgeReport::default());
    }

    #[tokio::test]
    async fn test_concurrent_purges_do_not_fail() {
        let dir = tempdir().unwrap();
        for i in 0..50 {
            write_aged(dir.path(), &format!("old-{i}.mp4"), Duration::from_secs(7200));
        }
        write_aged(dir.path(), "fresh.mp4", Duration::from_secs(1));

        let max_age = Duration::from_secs(3600);
        let (a, b) = tokio::join!(
            purge_expired(dir.path(), max_age),
            purge_expired(dir.path(), max_age)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        // Every expired file is deleted exactly once between the two passes.
        assert_eq!(a.removed + b.removed, 50);
        assert_eq!(names(dir.path()), vec!["fresh.mp4"]);
    }

    #[tokio::test]
    async fn test_manager_purge() {
        let dir = tempdir().unwrap();
        write_aged(dir.path(), "old.mp4", Duration::from_secs(120));
        write_aged(dir.path(), "new.mp4", Duration::from_secs(0));

        let manager = RetentionManager::new(dir.path(), Duration::from_secs(60));
        let report = manager.purge().await.unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(names(dir.path()), vec!["new.mp4"]);
    }

    #[tokio::test]
    async fn test_background_sweep_runs_immediately() {
        let dir = tempdir().unwrap();
        write_aged(dir.path(), "old.mp4", Duration::from_secs(120));

        let manager = Arc::new(RetentionManager::new(dir.path(), Duration::from_secs(60)));
        let handle = manager.start(Duration::from_secs(3600));

        let mut cleared = false;
        for _ in 0..50 {
            if names(dir.path()).is_empty() {
                cleared = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert!(cleared);
    }

    #[tokio::test]
    async fn test_purge_during_store_keeps_partial_and_finished_files() {
        use reelgrab_storage::{LocalStorage, Storage};
        use tokio::io::AsyncWriteExt;

        let dir = tempdir().unwrap();
        write_aged(dir.path(), "1600000000000-deadbeef.mp4", Duration::from_secs(7200));
        let storage = Arc::new(LocalStorage::new(dir.path(), "/media".to_string()).await.unwrap());

        let (mut writer, reader) = tokio::io::duplex(64);
        let store = {
            let storage = storage.clone();
            tokio::spawn(async move { storage.store_stream(None, 1024, Box::pin(reader)).await })
        };
        writer.write_all(b"first half ").await.unwrap();

        let mut partial = None;
        for _ in 0..100 {
            partial = names(dir.path()).into_iter().find(|n| n.ends_with(".part"));
            if partial.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let partial = partial.expect("store should have claimed a partial file");

        let report = purge_expired(dir.path(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(names(dir.path()), vec![partial]);

        writer.write_all(b"second half").await.unwrap();
        drop(writer);
        let stored = store.await.unwrap().unwrap();

        assert_eq!(stored.size_bytes, 22);
        assert_eq!(names(dir.path()), vec![stored.filename.clone()]);

        let report = purge_expired(dir.path(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(names(dir.path()), vec![stored.filename]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_undeletable_entries_are_skipped_and_scan_continues() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        for i in 0..3 {
            write_aged(&locked, &format!("old-{i}.mp4"), Duration::from_secs(7200));
        }
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory permissions.
        if std::fs::File::create(locked.join("write-check")).is_ok() {
            std::fs::remove_file(locked.join("write-check")).unwrap();
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = purge_expired(&locked, Duration::from_secs(60)).await.unwrap();
        assert_eq!(report.scanned, 3);
        assert_eq!(report.removed, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(names(&locked).len(), 3);

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        let report = purge_expired(&locked, Duration::from_secs(60)).await.unwrap();
        assert_eq!(report.removed, 3);
        assert!(names(&locked).is_empty());
    }
}
