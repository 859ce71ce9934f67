//! Reelgrab API Library
//!
//! This crate provides the HTTP handlers, error mapping, telemetry and
//! application setup for the download service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
