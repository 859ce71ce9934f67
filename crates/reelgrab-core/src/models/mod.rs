//! Domain models

pub mod media;
pub mod platform;
pub mod resolution;

pub use media::StoredMedia;
pub use platform::Platform;
pub use resolution::ResolutionResult;
