use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A fully written media file in the storage directory.
///
/// The directory listing is the only record of what exists; this value is a
/// snapshot handed back to the caller and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}
