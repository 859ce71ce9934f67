//! Reelgrab Services Layer
//!
//! Orchestration on top of the resolver and storage crates: streaming a
//! resolved media URL to disk, bounding the storage directory by age, and the
//! request pipeline that ties classification, resolution and acquisition
//! together under one deadline. The API crate depends on this facade.

pub mod acquisition;
pub mod pipeline;
pub mod retention;
pub mod ssrf;

pub use acquisition::{AcquisitionError, MediaAcquirer};
pub use pipeline::{DownloadOutcome, DownloadPipeline, PipelineError};
pub use reelgrab_resolver::{ProviderRegistry, ResolutionEngine, ResolutionError, ResolvedMedia};
pub use reelgrab_storage::{LocalStorage, Storage, StorageError, StorageResult};
pub use retention::{purge_expired, PurgeReport, RetentionManager};
