use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextSource;
use crate::scoring::batch::BatchCoordinator;
use crate::storage::ResultStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Scorer, worker pool and result store for one or many resumes.
    pub coordinator: Arc<BatchCoordinator>,
    /// Pluggable file → text conversion. Default: `DocumentExtractor`.
    pub text_source: Arc<dyn TextSource>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        self.coordinator.store()
    }
}
