//! Reelgrab Storage Library
//!
//! Storage abstraction for acquired media plus the local filesystem backend.
//!
//! # Filenames
//!
//! Every stored file gets a generated name `{unix_millis}-{random}.mp4` that
//! is never reused. Files being written carry a `.part` suffix until they are
//! complete; they are never listed or served. The directory listing is the
//! only record of what exists.

pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::{validate_filename, LocalStorage};
pub use traits::{ByteStream, MediaReader, Storage, StorageError, StorageResult};
