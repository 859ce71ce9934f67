//! API constants

/// Service version reported by the operational endpoints
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// API base path prefix
pub const API_BASE: &str = "/api";

/// Public prefix stored media is served under
pub const MEDIA_ROUTE: &str = "/media";

/// Default cap on concurrently handled requests
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10_000;

/// Largest accepted request body; download requests only carry a URL
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
