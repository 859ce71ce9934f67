//! Reelgrab Resolver
//!
//! Turns a social post URL into a direct media URL by walking an ordered list
//! of third-party providers. Each provider is plain configuration (a
//! `ProviderDescriptor`); the `ResolutionEngine` builds requests from it,
//! normalizes whatever comes back, and stops at the first usable answer.

pub mod catalogue;
pub mod descriptor;
pub mod engine;
pub mod registry;
pub mod transform;

pub use descriptor::{HttpMethod, ProviderDescriptor, RequestBody};
pub use engine::{summarize, AttemptError, ResolutionEngine, ResolutionError, ResolvedMedia};
pub use registry::{ProviderRegistry, RegistryError};
pub use transform::{ExtractedMedia, ResponseTransform};
