//! Error types module
//!
//! All failures that reach a caller are unified under `AppError`. Provider-level
//! transport and parse failures never appear here individually; the resolver
//! folds them into `ResolutionExhausted`.

use std::io;

use crate::constants::EXHAUSTED_MESSAGE;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for upstream failures outside our control
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return when the error is surfaced as a non-2xx response
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "RESOLUTION_EXHAUSTED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("no provider could resolve (attempted: {})", .attempted.join(", "))]
    ResolutionExhausted { attempted: Vec<String> },

    #[error("Acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Provide a non-empty post URL"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedPlatform(_) => (
            422,
            "UNSUPPORTED_PLATFORM",
            false,
            Some("Only TikTok and Instagram links are supported"),
            false,
            LogLevel::Debug,
        ),
        AppError::ResolutionExhausted { .. } => (
            502,
            "RESOLUTION_EXHAUSTED",
            true,
            Some("Try again later or try another link"),
            false,
            LogLevel::Warn,
        ),
        AppError::AcquisitionFailed(_) => (
            502,
            "ACQUISITION_FAILED",
            true,
            Some("Use the direct media URL instead"),
            false,
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("The file may have expired; download it again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Taxonomy name of the error, as reported in response bodies
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UnsupportedPlatform(_) => "UnsupportedPlatform",
            AppError::ResolutionExhausted { .. } => "ResolutionExhausted",
            AppError::AcquisitionFailed(_) => "AcquisitionFailed",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "InternalError",
            AppError::InternalWithSource { .. } => "InternalError",
        }
    }

    /// Providers attempted before the error, when the error carries them
    pub fn attempted_providers(&self) -> Option<&[String]> {
        match self {
            AppError::ResolutionExhausted { attempted } => Some(attempted),
            _ => None,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::UnsupportedPlatform(_) => "UnsupportedPlatform".to_string(),
            AppError::ResolutionExhausted { .. } => EXHAUSTED_MESSAGE.to_string(),
            AppError::AcquisitionFailed(_) => {
                "The video was found but could not be downloaded".to_string()
            }
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("File not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "File not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_unsupported_platform_message() {
        let err = AppError::UnsupportedPlatform("https://example.com/x".to_string());
        assert_eq!(err.client_message(), "UnsupportedPlatform");
        assert_eq!(err.error_type(), "UnsupportedPlatform");
        assert!(err.attempted_providers().is_none());
    }

    #[test]
    fn test_resolution_exhausted_carries_attempts() {
        let err = AppError::ResolutionExhausted {
            attempted: vec!["tikwm".to_string(), "ssstik".to_string()],
        };
        assert_eq!(err.client_message(), "no provider could resolve");
        assert_eq!(
            err.attempted_providers(),
            Some(&["tikwm".to_string(), "ssstik".to_string()][..])
        );
        assert!(err.to_string().contains("tikwm, ssstik"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::Internal("disk on fire".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.error_type(), "InternalError");

        let err: AppError = anyhow::anyhow!("boom").into();
        assert!(err.is_sensitive());
        assert_eq!(err.error_type(), "InternalError");
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("root cause").context("outer context");
        let err = AppError::InternalWithSource {
            message: "wrapped".to_string(),
            source,
        };
        let details = err.detailed_message();
        assert!(details.contains("Caused by"));
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err = AppError::AcquisitionFailed("403".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Use the direct media URL instead")
        );
        let err = AppError::InvalidInput("URL is required".to_string());
        assert_eq!(err.suggested_action(), Some("Provide a non-empty post URL"));
    }
}
