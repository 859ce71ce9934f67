//! Application state shared by every handler.

use reelgrab_core::Config;
use reelgrab_services::{DownloadPipeline, RetentionManager, Storage};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<DownloadPipeline>,
    pub storage: Arc<dyn Storage>,
    pub retention: Arc<RetentionManager>,
}
