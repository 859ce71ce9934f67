//! Shared constants

/// Extension given to every acquired media file.
pub const MEDIA_EXTENSION: &str = "mp4";

/// Content type served for acquired media files.
pub const MEDIA_CONTENT_TYPE: &str = "video/mp4";

/// Suffix of files that are still being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Service name reported by health endpoints and logs.
pub const SERVICE_NAME: &str = "reelgrab";

/// Error text returned when every provider for a platform failed.
pub const EXHAUSTED_MESSAGE: &str = "no provider could resolve";
