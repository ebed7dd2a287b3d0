use std::sync::Arc;

use crate::analysis_client::AnalysisService;
use crate::config::Config;
use crate::workflow::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    /// Scoring collaborator. Default: `HttpAnalysisClient` pointed at ANALYSIS_SERVICE_URL.
    pub analysis: Arc<dyn AnalysisService>,
}
